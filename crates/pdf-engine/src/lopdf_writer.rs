use crate::{DocumentWriter, ImageHandle, PageSize, PdfEngineError};
use doc_model::{Color, ExportPoint, ExportRect};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;

const FONT_RESOURCE: &str = "InkHelv";

#[derive(Debug, Clone, Copy)]
struct PageRecord {
    id: ObjectId,
    size: PageSize,
    /// Lower-left corner of the MediaBox; export coordinates are relative to it.
    origin: (f32, f32),
}

/// Drawing queued for one page until the document is saved.
#[derive(Debug, Default)]
struct PageOverlay {
    operations: Vec<Operation>,
    ext_gstates: BTreeMap<String, f32>,
    images: BTreeMap<String, ObjectId>,
    uses_font: bool,
}

impl PageOverlay {
    fn ext_gstate(&mut self, opacity: f32) -> String {
        let name = format!("InkGS{}", (opacity * 1000.0).round() as u32);
        self.ext_gstates.insert(name.clone(), opacity);
        name
    }
}

/// [`DocumentWriter`] over an in-memory lopdf document.
///
/// Draw calls are buffered per page. `save` appends one content stream per
/// touched page, after wrapping the existing content in `q`/`Q`.
#[derive(Debug)]
pub struct LopdfWriter {
    doc: Document,
    pages: Vec<PageRecord>,
    overlays: BTreeMap<u32, PageOverlay>,
    images: Vec<ObjectId>,
    font: Option<ObjectId>,
}

impl LopdfWriter {
    pub fn load(bytes: &[u8]) -> Result<Self, PdfEngineError> {
        let doc = match Document::load_mem(bytes) {
            Ok(doc) => doc,
            Err(err) if has_encrypt_marker(bytes) => {
                log::debug!("unparseable document carries an encryption marker: {err}");
                return Err(PdfEngineError::EncryptedUnsupported);
            }
            Err(err) => return Err(err.into()),
        };

        if doc.trailer.get(b"Encrypt").is_ok() {
            return Err(PdfEngineError::EncryptedUnsupported);
        }
        let pages: Vec<PageRecord> = doc
            .get_pages()
            .into_values()
            .map(|id| {
                let (size, origin) = media_box(&doc, id);
                PageRecord { id, size, origin }
            })
            .collect();

        if pages.is_empty() {
            return Err(PdfEngineError::Backend("document has no pages".to_owned()));
        }

        Ok(Self { doc, pages, overlays: BTreeMap::new(), images: Vec::new(), font: None })
    }

    fn page(&self, page_index: u32) -> Result<PageRecord, PdfEngineError> {
        self.pages.get(page_index as usize).copied().ok_or(PdfEngineError::PageOutOfRange {
            page: page_index,
            page_count: self.pages.len() as u32,
        })
    }

    fn font_id(&mut self) -> ObjectId {
        if let Some(id) = self.font {
            return id;
        }

        let id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        self.font = Some(id);
        id
    }

    fn apply_overlay(
        &mut self,
        page_id: ObjectId,
        overlay: PageOverlay,
    ) -> Result<(), PdfEngineError> {
        let mut resources = inherited_resources(&self.doc, page_id);

        if overlay.uses_font {
            let font_id = self.font_id();
            merge_category(
                &self.doc,
                &mut resources,
                b"Font",
                [(FONT_RESOURCE.to_owned(), Object::Reference(font_id))],
            );
        }

        if !overlay.ext_gstates.is_empty() {
            let states = overlay.ext_gstates.into_iter().map(|(name, opacity)| {
                let state = dictionary! { "Type" => "ExtGState", "CA" => opacity, "ca" => opacity };
                (name, Object::Dictionary(state))
            });
            merge_category(&self.doc, &mut resources, b"ExtGState", states);
        }

        if !overlay.images.is_empty() {
            let images = overlay.images.into_iter().map(|(name, id)| (name, Object::Reference(id)));
            merge_category(&self.doc, &mut resources, b"XObject", images);
        }

        let existing = page_contents(&self.doc, page_id);
        let mut operations = overlay.operations;
        let mut contents = Vec::with_capacity(existing.len() + 2);

        if !existing.is_empty() {
            let save_id = self.doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            contents.push(Object::Reference(save_id));
            contents.extend(existing);
            operations.insert(0, Operation::new("Q", vec![]));
        }

        // Readers join content streams byte for byte.
        let mut encoded = b"\n".to_vec();
        encoded.extend(Content { operations }.encode()?);
        let overlay_id = self.doc.add_object(Stream::new(Dictionary::new(), encoded));
        contents.push(Object::Reference(overlay_id));

        let page_dict = self.doc.get_object_mut(page_id)?.as_dict_mut()?;
        page_dict.set("Resources", Object::Dictionary(resources));
        page_dict.set("Contents", Object::Array(contents));

        Ok(())
    }
}

impl DocumentWriter for LopdfWriter {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_size(&self, page_index: u32) -> Result<PageSize, PdfEngineError> {
        Ok(self.page(page_index)?.size)
    }

    fn draw_rectangle(
        &mut self,
        page_index: u32,
        rect: ExportRect,
        fill: Color,
        opacity: f32,
    ) -> Result<(), PdfEngineError> {
        let page = self.page(page_index)?;
        let (ox, oy) = page.origin;
        let (r, g, b) = fill.to_normalized();

        let overlay = self.overlays.entry(page_index).or_default();
        let state = overlay.ext_gstate(opacity.clamp(0.0, 1.0));
        overlay.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("gs", vec![Object::Name(state.into_bytes())]),
            Operation::new("rg", vec![r.into(), g.into(), b.into()]),
            Operation::new(
                "re",
                vec![
                    (rect.x + ox).into(),
                    (rect.y + oy).into(),
                    rect.width.into(),
                    rect.height.into(),
                ],
            ),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);

        Ok(())
    }

    fn draw_text(
        &mut self,
        page_index: u32,
        text: &str,
        origin: ExportPoint,
        size: f32,
        fill: Color,
    ) -> Result<(), PdfEngineError> {
        let page = self.page(page_index)?;
        let (ox, oy) = page.origin;
        let (r, g, b) = fill.to_normalized();

        let overlay = self.overlays.entry(page_index).or_default();
        overlay.uses_font = true;
        overlay.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("rg", vec![r.into(), g.into(), b.into()]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(FONT_RESOURCE.as_bytes().to_vec()), size.into()],
            ),
            Operation::new("Td", vec![(origin.x + ox).into(), (origin.y + oy).into()]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ]);

        Ok(())
    }

    fn embed_image(&mut self, bytes: &[u8]) -> Result<ImageHandle, PdfEngineError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        let mut alpha = Vec::with_capacity((width * height) as usize);
        for pixel in rgba.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
            alpha.push(pixel.0[3]);
        }

        let smask_id = self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            alpha,
        ));

        let image_id = self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "SMask" => smask_id,
            },
            rgb,
        ));

        self.images.push(image_id);
        Ok(ImageHandle::new(self.images.len() - 1))
    }

    fn draw_image(
        &mut self,
        page_index: u32,
        image: ImageHandle,
        rect: ExportRect,
    ) -> Result<(), PdfEngineError> {
        let page = self.page(page_index)?;
        let (ox, oy) = page.origin;
        let image_id =
            *self.images.get(image.index()).ok_or(PdfEngineError::InvalidImage(image.index()))?;
        let name = format!("InkIm{}", image.index());

        let overlay = self.overlays.entry(page_index).or_default();
        overlay.images.insert(name.clone(), image_id);
        overlay.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    rect.width.into(),
                    0.0_f32.into(),
                    0.0_f32.into(),
                    rect.height.into(),
                    (rect.x + ox).into(),
                    (rect.y + oy).into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);

        Ok(())
    }

    fn save(&mut self) -> Result<Vec<u8>, PdfEngineError> {
        let overlays = std::mem::take(&mut self.overlays);
        for (page_index, overlay) in overlays {
            if overlay.operations.is_empty() {
                continue;
            }
            let page = self.page(page_index)?;
            self.apply_overlay(page.id, overlay)?;
        }

        let mut output = Vec::new();
        self.doc.save_to(&mut output)?;
        Ok(output)
    }
}

/// Only consulted when parsing failed; a valid document is judged by its trailer.
fn has_encrypt_marker(bytes: &[u8]) -> bool {
    bytes.windows(b"/Encrypt".len()).any(|window| window == b"/Encrypt")
}

fn media_box(doc: &Document, page_id: ObjectId) -> (PageSize, (f32, f32)) {
    let mut current = Some(page_id);
    while let Some(id) = current {
        let Ok(dict) = doc.get_dictionary(id) else {
            break;
        };

        if let Some(found) = dict.get(b"MediaBox").ok().and_then(|obj| parse_box(doc, obj)) {
            return found;
        }

        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }

    (PageSize::default(), (0.0, 0.0))
}

fn parse_box(doc: &Document, obj: &Object) -> Option<(PageSize, (f32, f32))> {
    let obj = match obj {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let array = obj.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }

    let x0 = array[0].as_float().ok()?;
    let y0 = array[1].as_float().ok()?;
    let x1 = array[2].as_float().ok()?;
    let y1 = array[3].as_float().ok()?;

    let size = PageSize { width_pt: (x1 - x0).abs(), height_pt: (y1 - y0).abs() };
    Some((size, (x0.min(x1), y0.min(y1))))
}

fn resolve_dictionary(doc: &Document, obj: &Object) -> Option<Dictionary> {
    match obj {
        Object::Dictionary(dict) => Some(dict.clone()),
        Object::Reference(id) => doc.get_dictionary(*id).ok().cloned(),
        _ => None,
    }
}

/// Owned copy of the page's effective resources, following `Parent` inheritance.
fn inherited_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    let mut current = Some(page_id);
    while let Some(id) = current {
        let Ok(dict) = doc.get_dictionary(id) else {
            break;
        };

        let resources = dict.get(b"Resources").ok().and_then(|obj| resolve_dictionary(doc, obj));
        if let Some(resources) = resources {
            return resources;
        }

        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }

    Dictionary::new()
}

fn merge_category(
    doc: &Document,
    resources: &mut Dictionary,
    category: &[u8],
    entries: impl IntoIterator<Item = (String, Object)>,
) {
    let mut dict = resources
        .get(category)
        .ok()
        .and_then(|obj| resolve_dictionary(doc, obj))
        .unwrap_or_else(Dictionary::new);

    for (name, value) in entries {
        dict.set(name, value);
    }

    resources.set(category.to_vec(), Object::Dictionary(dict));
}

fn page_contents(doc: &Document, page_id: ObjectId) -> Vec<Object> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };

    match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

/// Maps text onto the WinAnsi code points Helvetica can show. Anything else
/// becomes `?`; line breaks become spaces.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch as u32 {
            0x0A | 0x0D | 0x09 => b' ',
            code @ 0x20..=0x7E | code @ 0xA0..=0xFF => code as u8,
            _ => b'?',
        })
        .collect()
}
