//! Bakes stored annotations into a copy of the source document.

use crate::{DocumentWriter, LopdfWriter, PdfEngineError};
use doc_model::{
    to_export_point, to_export_rect, Annotation, AnnotationBody, AnnotationId, AnnotationStore,
    AnnotatorConfig,
};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, PartialEq)]
pub struct ExportStyle {
    pub highlight_opacity: f32,
    pub underline_opacity: f32,
    pub comment_font_size: f32,
}

impl From<&AnnotatorConfig> for ExportStyle {
    fn from(config: &AnnotatorConfig) -> Self {
        Self {
            highlight_opacity: config.highlight_opacity,
            underline_opacity: config.underline_opacity,
            comment_font_size: config.comment_font_size,
        }
    }
}

impl Default for ExportStyle {
    fn default() -> Self {
        Self::from(&AnnotatorConfig::default())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to load source document: {0}")]
    Load(#[source] PdfEngineError),
    #[error("failed to save annotated document: {0}")]
    Save(#[source] PdfEngineError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    PageOutOfRange { page: u32, page_count: u32 },
    Signature(String),
    Draw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedAnnotation {
    pub id: AnnotationId,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportReport {
    pub drawn: usize,
    pub skipped: Vec<SkippedAnnotation>,
}

impl ExportReport {
    fn skip(&mut self, id: AnnotationId, reason: SkipReason) {
        log::warn!("annotation {id} left out of export: {reason:?}");
        self.skipped.push(SkippedAnnotation { id, reason });
    }
}

#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub report: ExportReport,
}

/// Draws every annotation onto its page, page by page in store order.
///
/// A failure on one annotation is logged and recorded in the report; the
/// remaining annotations are still drawn.
pub fn encode_annotations<W: DocumentWriter>(
    writer: &mut W,
    store: &AnnotationStore,
    style: &ExportStyle,
) -> ExportReport {
    let mut report = ExportReport::default();
    let page_count = writer.page_count();

    for page_index in 0..page_count {
        let page_height = match writer.page_size(page_index) {
            Ok(size) => size.height_pt,
            Err(err) => {
                for annotation in store.list_by_page(page_index + 1) {
                    report.skip(annotation.id(), SkipReason::Draw(err.to_string()));
                }
                continue;
            }
        };

        for annotation in store.list_by_page(page_index + 1) {
            match draw_annotation(writer, page_index, page_height, annotation, style) {
                Ok(()) => report.drawn += 1,
                Err(reason) => report.skip(annotation.id(), reason),
            }
        }
    }

    for annotation in store.iter().filter(|a| a.page() == 0 || a.page() > page_count) {
        let reason = SkipReason::PageOutOfRange { page: annotation.page(), page_count };
        report.skip(annotation.id(), reason);
    }

    report
}

fn draw_annotation<W: DocumentWriter>(
    writer: &mut W,
    page_index: u32,
    page_height: f32,
    annotation: &Annotation,
    style: &ExportStyle,
) -> Result<(), SkipReason> {
    let draw_err = |err: PdfEngineError| SkipReason::Draw(err.to_string());
    let color = annotation.color();

    match annotation.body() {
        AnnotationBody::Highlight { bounds } => {
            let rect = to_export_rect(*bounds, page_height);
            writer
                .draw_rectangle(page_index, rect, color, style.highlight_opacity)
                .map_err(draw_err)
        }
        AnnotationBody::Underline { bounds } => {
            let rect = to_export_rect(*bounds, page_height);
            writer
                .draw_rectangle(page_index, rect, color, style.underline_opacity)
                .map_err(draw_err)
        }
        AnnotationBody::Comment { text } => {
            if text.is_empty() {
                return Ok(());
            }
            let origin = to_export_point(annotation.anchor(), page_height);
            writer
                .draw_text(page_index, text, origin, style.comment_font_size, color)
                .map_err(draw_err)
        }
        AnnotationBody::Signature { bounds, image } => {
            let bytes = image.decode().map_err(|err| SkipReason::Signature(err.to_string()))?;
            let handle =
                writer.embed_image(&bytes).map_err(|err| SkipReason::Signature(err.to_string()))?;
            let rect = to_export_rect(*bounds, page_height);
            writer.draw_image(page_index, handle, rect).map_err(draw_err)
        }
    }
}

/// Loads `source`, bakes in every annotation and serializes the result.
/// Nothing is returned unless the save succeeded.
pub fn export_pdf(
    source: &[u8],
    store: &AnnotationStore,
    style: &ExportStyle,
) -> Result<(Vec<u8>, ExportReport), ExportError> {
    let writer = LopdfWriter::load(source).map_err(ExportError::Load)?;
    export_with(writer, store, style)
}

/// Bakes annotations through an already loaded writer.
pub fn export_with<W: DocumentWriter>(
    mut writer: W,
    store: &AnnotationStore,
    style: &ExportStyle,
) -> Result<(Vec<u8>, ExportReport), ExportError> {
    let report = encode_annotations(&mut writer, store, style);
    let bytes = writer.save().map_err(ExportError::Save)?;

    log::info!("exported {} annotation(s), skipped {}", report.drawn, report.skipped.len());
    Ok((bytes, report))
}

/// Runs exports one at a time. A request made while another export is in
/// flight waits for it to finish before starting.
#[derive(Debug, Default)]
pub struct ExportCoordinator {
    completed: Mutex<u64>,
}

impl ExportCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run<T>(&self, job: impl FnOnce() -> T) -> T {
        let mut completed = self.completed.lock().unwrap_or_else(PoisonError::into_inner);
        let output = job();
        *completed += 1;
        output
    }

    pub fn completed(&self) -> u64 {
        *self.completed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
