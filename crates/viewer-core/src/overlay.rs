//! Read-only projection of stored annotations onto the rendered page.

use doc_model::{
    Annotation, AnnotationBody, AnnotationId, AnnotationKind, AnnotationStore, Color, PagePoint,
    PageRect,
};

/// Hit box, in page units, of a comment marker drawn from its anchor.
pub const COMMENT_MARKER_SIZE: f32 = 24.0;

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayContent {
    Fill,
    CommentBubble { text: String },
    SignatureImage { data_url: String },
}

/// Positioned element in surface pixels (already multiplied by the zoom).
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayElement {
    pub id: AnnotationId,
    pub kind: AnnotationKind,
    pub left: f32,
    pub top: f32,
    /// `None` for point comments, which size to their text.
    pub size: Option<(f32, f32)>,
    /// Signatures carry their own pixels and have no fill.
    pub fill: Option<Color>,
    pub content: OverlayContent,
    pub selected: bool,
    pub draft: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SidebarEntry {
    pub id: AnnotationId,
    pub page: u32,
    pub label: &'static str,
    pub color: Color,
    pub text: Option<String>,
    pub selected: bool,
}

/// Elements for `page` in store order, followed by the live draft if it is on
/// that page.
pub fn layout_page(
    store: &AnnotationStore,
    page: u32,
    scale: f32,
    draft: Option<&Annotation>,
) -> Vec<OverlayElement> {
    let selected = store.selected();
    let mut elements: Vec<_> = store
        .list_by_page(page)
        .map(|annotation| element_for(annotation, scale, selected == Some(annotation.id()), false))
        .collect();

    if let Some(draft) = draft.filter(|draft| draft.page() == page) {
        elements.push(element_for(draft, scale, false, true));
    }

    elements
}

fn element_for(annotation: &Annotation, scale: f32, selected: bool, draft: bool) -> OverlayElement {
    let position = annotation
        .bounds()
        .map_or(annotation.anchor(), |bounds| PagePoint::new(bounds.x, bounds.y));
    let size = annotation.bounds().map(|bounds| (bounds.width * scale, bounds.height * scale));

    let (fill, content) = match annotation.body() {
        AnnotationBody::Highlight { .. } | AnnotationBody::Underline { .. } => {
            (Some(annotation.color()), OverlayContent::Fill)
        }
        AnnotationBody::Comment { text } => {
            (Some(annotation.color()), OverlayContent::CommentBubble { text: text.clone() })
        }
        AnnotationBody::Signature { image, .. } => {
            (None, OverlayContent::SignatureImage { data_url: image.data_url().to_owned() })
        }
    };

    OverlayElement {
        id: annotation.id(),
        kind: annotation.kind(),
        left: position.x * scale,
        top: position.y * scale,
        size,
        fill,
        content,
        selected,
        draft,
    }
}

/// Topmost annotation on `page` under a page-space point.
pub fn annotation_at(
    store: &AnnotationStore,
    page: u32,
    point: PagePoint,
) -> Option<AnnotationId> {
    store
        .list_by_page(page)
        .filter(|annotation| hit_box(annotation).contains(point))
        .last()
        .map(Annotation::id)
}

fn hit_box(annotation: &Annotation) -> PageRect {
    annotation.bounds().unwrap_or_else(|| {
        let anchor = annotation.anchor();
        PageRect::new(anchor.x, anchor.y, COMMENT_MARKER_SIZE, COMMENT_MARKER_SIZE)
    })
}

pub fn sidebar_entries(store: &AnnotationStore) -> Vec<SidebarEntry> {
    store
        .iter()
        .map(|annotation| SidebarEntry {
            id: annotation.id(),
            page: annotation.page(),
            label: annotation.kind().label(),
            color: annotation.color(),
            text: annotation.text().map(str::to_owned),
            selected: store.selected() == Some(annotation.id()),
        })
        .collect()
}
