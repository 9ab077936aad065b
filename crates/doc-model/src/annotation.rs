//! Annotation records.
//!
//! An annotation is a common header (identity, page, anchor, color) plus a
//! per-kind body. Only the body variants carry the fields that make sense for
//! them, so a comment can never hold a raster and a highlight never holds text.

use crate::color::Color;
use crate::geometry::{PagePoint, PageRect};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Unique identifier, generated once at creation and never reused.
pub type AnnotationId = uuid::Uuid;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Highlight,
    Underline,
    Comment,
    Signature,
}

impl AnnotationKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Highlight => "Highlight",
            Self::Underline => "Underline",
            Self::Comment => "Comment",
            Self::Signature => "Signature",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureDataError {
    #[error("signature payload is not a base64 data URL")]
    NotDataUrl,
    #[error("signature payload is not valid base64: {0}")]
    Base64(String),
    #[error("signature payload is empty")]
    Empty,
}

/// Raster signature payload kept as a `data:` URL, the form a signature pad hands back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureImage {
    data_url: String,
}

impl SignatureImage {
    pub fn from_data_url(data_url: impl Into<String>) -> Self {
        Self { data_url: data_url.into() }
    }

    pub fn from_png(bytes: &[u8]) -> Self {
        Self { data_url: format!("{PNG_DATA_URL_PREFIX}{}", B64.encode(bytes)) }
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// Raw image bytes behind the data URL.
    pub fn decode(&self) -> Result<Vec<u8>, SignatureDataError> {
        let (header, payload) =
            self.data_url.split_once(',').ok_or(SignatureDataError::NotDataUrl)?;
        if !header.starts_with("data:") || !header.ends_with(";base64") {
            return Err(SignatureDataError::NotDataUrl);
        }

        let bytes = B64
            .decode(payload.trim())
            .map_err(|err| SignatureDataError::Base64(err.to_string()))?;
        if bytes.is_empty() {
            return Err(SignatureDataError::Empty);
        }

        Ok(bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnnotationBody {
    Highlight { bounds: PageRect },
    Underline { bounds: PageRect },
    Comment { text: String },
    Signature { bounds: PageRect, image: SignatureImage },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    id: AnnotationId,
    /// 1-based page number, fixed at creation.
    page: u32,
    anchor: PagePoint,
    color: Color,
    #[serde(flatten)]
    body: AnnotationBody,
}

impl Annotation {
    fn with_body(page: u32, anchor: PagePoint, color: Color, body: AnnotationBody) -> Self {
        Self { id: AnnotationId::new_v4(), page, anchor, color, body }
    }

    /// Draft highlight with zero-size bounds on the anchor.
    pub fn highlight(page: u32, anchor: PagePoint, color: Color) -> Self {
        let body = AnnotationBody::Highlight { bounds: PageRect::at(anchor) };
        Self::with_body(page, anchor, color, body)
    }

    /// Draft underline with zero-size bounds on the anchor.
    pub fn underline(page: u32, anchor: PagePoint, color: Color) -> Self {
        let body = AnnotationBody::Underline { bounds: PageRect::at(anchor) };
        Self::with_body(page, anchor, color, body)
    }

    pub fn comment(page: u32, anchor: PagePoint, color: Color, text: impl Into<String>) -> Self {
        Self::with_body(page, anchor, color, AnnotationBody::Comment { text: text.into() })
    }

    /// Signature whose bounds start at the anchor with a fixed size.
    pub fn signature(
        page: u32,
        anchor: PagePoint,
        color: Color,
        size: (f32, f32),
        image: SignatureImage,
    ) -> Self {
        let bounds = PageRect::new(anchor.x, anchor.y, size.0, size.1);
        Self::with_body(page, anchor, color, AnnotationBody::Signature { bounds, image })
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn anchor(&self) -> PagePoint {
        self.anchor
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn body(&self) -> &AnnotationBody {
        &self.body
    }

    pub fn kind(&self) -> AnnotationKind {
        match self.body {
            AnnotationBody::Highlight { .. } => AnnotationKind::Highlight,
            AnnotationBody::Underline { .. } => AnnotationKind::Underline,
            AnnotationBody::Comment { .. } => AnnotationKind::Comment,
            AnnotationBody::Signature { .. } => AnnotationKind::Signature,
        }
    }

    /// Bounds for rectangle kinds, `None` for point comments.
    pub fn bounds(&self) -> Option<PageRect> {
        match &self.body {
            AnnotationBody::Highlight { bounds }
            | AnnotationBody::Underline { bounds }
            | AnnotationBody::Signature { bounds, .. } => Some(*bounds),
            AnnotationBody::Comment { .. } => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.body {
            AnnotationBody::Comment { text } => Some(text),
            _ => None,
        }
    }

    pub fn signature_image(&self) -> Option<&SignatureImage> {
        match &self.body {
            AnnotationBody::Signature { image, .. } => Some(image),
            _ => None,
        }
    }

    /// Replaces the bounds of a rectangle kind. Returns `false` for comments.
    pub fn set_bounds(&mut self, rect: PageRect) -> bool {
        match &mut self.body {
            AnnotationBody::Highlight { bounds }
            | AnnotationBody::Underline { bounds }
            | AnnotationBody::Signature { bounds, .. } => {
                *bounds = rect;
                true
            }
            AnnotationBody::Comment { .. } => false,
        }
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drafts_start_with_zero_bounds_on_anchor() {
        let anchor = PagePoint::new(12.0, 34.0);
        let draft = Annotation::highlight(1, anchor, Color::default());

        let bounds = draft.bounds().expect("highlight should have bounds");
        assert_eq!(bounds, PageRect::at(anchor));
        assert!(!bounds.has_area());
    }

    #[test]
    fn each_annotation_gets_a_fresh_id() {
        let a = Annotation::comment(1, PagePoint::default(), Color::default(), "a");
        let b = Annotation::comment(1, PagePoint::default(), Color::default(), "a");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn comment_has_text_but_no_bounds() {
        let comment = Annotation::comment(3, PagePoint::new(1.0, 2.0), Color::BLACK, "Review");
        assert_eq!(comment.kind(), AnnotationKind::Comment);
        assert_eq!(comment.text(), Some("Review"));
        assert_eq!(comment.bounds(), None);
        assert!(comment.signature_image().is_none());
    }

    #[test]
    fn set_bounds_is_refused_for_comments() {
        let mut comment = Annotation::comment(1, PagePoint::default(), Color::BLACK, "x");
        assert!(!comment.set_bounds(PageRect::new(0.0, 0.0, 5.0, 5.0)));
        assert_eq!(comment.bounds(), None);
    }

    #[test]
    fn signature_bounds_use_fixed_size() {
        let image = SignatureImage::from_png(&[1, 2, 3]);
        let anchor = PagePoint::new(40.0, 60.0);
        let sig = Annotation::signature(2, anchor, Color::BLACK, (200.0, 100.0), image);
        assert_eq!(sig.bounds(), Some(PageRect::new(40.0, 60.0, 200.0, 100.0)));
        assert_eq!(sig.kind().label(), "Signature");
    }

    #[test]
    fn signature_image_round_trips_through_data_url() {
        let image = SignatureImage::from_png(&[0x89, b'P', b'N', b'G']);
        assert!(image.data_url().starts_with("data:image/png;base64,"));
        assert_eq!(image.decode().expect("decode should succeed"), vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn malformed_signature_payloads_fail_to_decode() {
        let no_comma = SignatureImage::from_data_url("iVBORw0KGgo");
        assert_eq!(no_comma.decode(), Err(SignatureDataError::NotDataUrl));

        let bad_base64 = SignatureImage::from_data_url("data:image/png;base64,***");
        assert!(matches!(bad_base64.decode(), Err(SignatureDataError::Base64(_))));

        let empty = SignatureImage::from_data_url("data:image/png;base64,");
        assert_eq!(empty.decode(), Err(SignatureDataError::Empty));
    }

    #[test]
    fn serializes_with_kind_tag() {
        let comment = Annotation::comment(1, PagePoint::new(1.0, 2.0), Color::BLACK, "hi");
        let value = serde_json::to_value(&comment).expect("serialize should succeed");

        assert_eq!(value["kind"], "comment");
        assert_eq!(value["text"], "hi");
        assert_eq!(value["color"], "#000000");
        assert_eq!(value["page"], 1);
    }
}
