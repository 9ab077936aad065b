//! Pointer-gesture capture.
//!
//! One [`CaptureController`] owns the whole gesture state. At most one draft
//! exists at a time, and it lives inside [`CaptureState::Drafting`] rather
//! than in the store until the gesture is released with a visible size.

use crate::signature::{PendingSignature, SignaturePad};
use doc_model::{
    Annotation, AnnotationId, AnnotationStore, AnnotatorConfig, Color, PagePoint, PageRect,
    PageSurface, ScreenPoint, SignatureImage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Highlight,
    Underline,
    Comment,
    Signature,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    Armed(Tool),
    Drafting { tool: Tool, draft: Annotation },
    /// Comment placed, waiting for the host to supply its text.
    AwaitingComment { page: u32, anchor: PagePoint },
    /// Signature pad open for a pending placement.
    Signing(PendingSignature),
}

/// What a capture call did.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    Ignored,
    DraftStarted(AnnotationId),
    DraftUpdated(AnnotationId),
    Committed(AnnotationId),
    Discarded,
    CommentRequested { page: u32, anchor: PagePoint },
    SignatureRequested(PendingSignature),
    SignatureCancelled,
    Selected(Option<AnnotationId>),
}

#[derive(Debug, Clone)]
pub struct CaptureController {
    state: CaptureState,
    color: Color,
    underline_thickness: f32,
    signature_size: (f32, f32),
    default_comment_text: String,
}

impl CaptureController {
    pub fn new(config: &AnnotatorConfig) -> Self {
        Self {
            state: CaptureState::Idle,
            color: config.default_color,
            underline_thickness: config.underline_thickness,
            signature_size: config.signature_size(),
            default_comment_text: config.default_comment_text.clone(),
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn tool(&self) -> Option<Tool> {
        match &self.state {
            CaptureState::Idle => None,
            CaptureState::Armed(tool) | CaptureState::Drafting { tool, .. } => Some(*tool),
            CaptureState::AwaitingComment { .. } => Some(Tool::Comment),
            CaptureState::Signing(_) => Some(Tool::Signature),
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Switching tools abandons whatever gesture was in progress.
    pub fn set_tool(&mut self, tool: Option<Tool>) {
        match &self.state {
            CaptureState::Drafting { draft, .. } => {
                log::debug!("tool switch discarded draft {}", draft.id());
            }
            CaptureState::AwaitingComment { .. } => {
                log::debug!("tool switch discarded pending comment");
            }
            CaptureState::Signing(_) => log::debug!("tool switch closed signature pad"),
            CaptureState::Idle | CaptureState::Armed(_) => {}
        }

        self.state = match tool {
            Some(tool) => CaptureState::Armed(tool),
            None => CaptureState::Idle,
        };
    }

    /// The in-progress draft, for live rendering.
    pub fn draft(&self) -> Option<&Annotation> {
        match &self.state {
            CaptureState::Drafting { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn pending_signature(&self) -> Option<PendingSignature> {
        match self.state {
            CaptureState::Signing(pending) => Some(pending),
            _ => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self.state,
            CaptureState::Drafting { .. }
                | CaptureState::AwaitingComment { .. }
                | CaptureState::Signing(_)
        )
    }

    pub fn pointer_down(&mut self, surface: &PageSurface, pointer: ScreenPoint) -> CaptureEvent {
        let tool = match &self.state {
            CaptureState::Armed(tool) => *tool,
            CaptureState::Idle => return CaptureEvent::Ignored,
            busy => {
                log::debug!("ignoring pointer-down while {busy:?} is in progress");
                return CaptureEvent::Ignored;
            }
        };

        let anchor = surface.to_page_space(pointer);
        let page = surface.page;

        match tool {
            Tool::Comment => {
                self.state = CaptureState::AwaitingComment { page, anchor };
                CaptureEvent::CommentRequested { page, anchor }
            }
            Tool::Signature => {
                let pending = PendingSignature { page, anchor };
                self.state = CaptureState::Signing(pending);
                CaptureEvent::SignatureRequested(pending)
            }
            Tool::Highlight | Tool::Underline => {
                let draft = if tool == Tool::Highlight {
                    Annotation::highlight(page, anchor, self.color)
                } else {
                    Annotation::underline(page, anchor, self.color)
                };
                let id = draft.id();
                self.state = CaptureState::Drafting { tool, draft };
                CaptureEvent::DraftStarted(id)
            }
        }
    }

    pub fn pointer_move(
        &mut self,
        store: &mut AnnotationStore,
        surface: &PageSurface,
        pointer: ScreenPoint,
    ) -> CaptureEvent {
        let point = surface.to_page_space(pointer);
        let color = self.color;
        let thickness = self.underline_thickness;

        let CaptureState::Drafting { tool, draft } = &mut self.state else {
            return CaptureEvent::Ignored;
        };

        let bounds = draft_bounds(*tool, draft.anchor(), point, thickness);
        draft.set_bounds(bounds);
        draft.set_color(color);
        // No-op until the draft is committed.
        store.update(draft);
        CaptureEvent::DraftUpdated(draft.id())
    }

    /// Ends a drag. The draft is committed only if its bounds have area.
    pub fn pointer_up(
        &mut self,
        store: &mut AnnotationStore,
        surface: &PageSurface,
        pointer: ScreenPoint,
    ) -> CaptureEvent {
        if !matches!(self.state, CaptureState::Drafting { .. }) {
            return CaptureEvent::Ignored;
        }

        self.pointer_move(store, surface, pointer);

        let CaptureState::Drafting { tool, draft } =
            std::mem::replace(&mut self.state, CaptureState::Idle)
        else {
            return CaptureEvent::Ignored;
        };
        self.state = CaptureState::Armed(tool);

        if draft.bounds().is_some_and(|bounds| bounds.has_area()) {
            let id = draft.id();
            log::info!("committed {} {id} on page {}", draft.kind().label(), draft.page());
            store.add(draft);
            CaptureEvent::Committed(id)
        } else {
            log::debug!("discarded zero-area {} draft", draft.kind().label());
            CaptureEvent::Discarded
        }
    }

    /// Answers a comment request. `None` means the prompt was cancelled; blank
    /// text falls back to the configured default.
    pub fn submit_comment(
        &mut self,
        store: &mut AnnotationStore,
        text: Option<&str>,
    ) -> CaptureEvent {
        let CaptureState::AwaitingComment { page, anchor } = self.state else {
            return CaptureEvent::Ignored;
        };
        self.state = CaptureState::Armed(Tool::Comment);

        let Some(text) = text else {
            log::debug!("comment prompt cancelled");
            return CaptureEvent::Discarded;
        };

        let text = if text.trim().is_empty() { self.default_comment_text.as_str() } else { text };
        let annotation = Annotation::comment(page, anchor, self.color, text);
        let id = annotation.id();

        log::info!("committed Comment {id} on page {page}");
        store.add(annotation);
        store.select(Some(id));
        CaptureEvent::Committed(id)
    }

    /// Saves the pad into a signature annotation at the pending position.
    /// An empty pad counts as a cancel.
    pub fn save_signature(
        &mut self,
        store: &mut AnnotationStore,
        pad: &mut dyn SignaturePad,
    ) -> CaptureEvent {
        let CaptureState::Signing(pending) = self.state else {
            return CaptureEvent::Ignored;
        };
        self.state = CaptureState::Armed(Tool::Signature);

        let raster = if pad.is_empty() { None } else { pad.to_raster() };
        let Some(raster) = raster else {
            log::warn!("signature pad is empty; nothing saved");
            return CaptureEvent::SignatureCancelled;
        };

        let annotation = Annotation::signature(
            pending.page,
            pending.anchor,
            self.color,
            self.signature_size,
            SignatureImage::from_png(&raster),
        );
        let id = annotation.id();

        log::info!("committed Signature {id} on page {}", pending.page);
        store.add(annotation);
        pad.clear();
        CaptureEvent::Committed(id)
    }

    pub fn cancel_signature(&mut self) -> CaptureEvent {
        if !matches!(self.state, CaptureState::Signing(_)) {
            return CaptureEvent::Ignored;
        }

        self.state = CaptureState::Armed(Tool::Signature);
        CaptureEvent::SignatureCancelled
    }
}

fn draft_bounds(
    tool: Tool,
    anchor: PagePoint,
    point: PagePoint,
    underline_thickness: f32,
) -> PageRect {
    let span = PageRect::spanning(anchor, point);
    match tool {
        Tool::Underline => PageRect::new(span.x, anchor.y, span.width, underline_thickness),
        _ => span,
    }
}
