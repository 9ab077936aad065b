//! One open document with its annotations, view and capture state.

use crate::capture::{CaptureController, CaptureEvent, Tool};
use crate::overlay::{annotation_at, layout_page, sidebar_entries, OverlayElement, SidebarEntry};
use crate::signature::SignaturePad;
use crate::viewport::ViewportState;
use doc_model::{AnnotationId, AnnotationStore, AnnotatorConfig, Color, PageSurface, ScreenPoint};
use pdf_engine::{export_pdf, ExportCoordinator, ExportError, ExportStyle, ExportedFile};

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// A file handed over by file selection or drag-drop.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub media_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Only PDFs are accepted. Without a media type the file name decides.
pub fn accepts_upload(name: &str, media_type: Option<&str>) -> bool {
    match media_type {
        Some(media_type) => media_type.eq_ignore_ascii_case(PDF_MEDIA_TYPE),
        None => name.to_ascii_lowercase().ends_with(".pdf"),
    }
}

#[derive(Debug)]
pub struct DocumentSession {
    name: String,
    source: Vec<u8>,
    config: AnnotatorConfig,
    store: AnnotationStore,
    capture: CaptureController,
    viewport: ViewportState,
    exports: ExportCoordinator,
}

impl DocumentSession {
    /// Starts a session for an accepted upload. Rejected uploads create nothing.
    pub fn open(upload: Upload, config: AnnotatorConfig) -> Option<Self> {
        if !accepts_upload(&upload.name, upload.media_type.as_deref()) {
            log::debug!("rejected upload {} ({:?})", upload.name, upload.media_type);
            return None;
        }

        let config = config.sanitized();
        Some(Self {
            name: upload.name,
            source: upload.bytes,
            capture: CaptureController::new(&config),
            config,
            store: AnnotationStore::new(),
            viewport: ViewportState::default(),
            exports: ExportCoordinator::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn capture(&self) -> &CaptureController {
        &self.capture
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut ViewportState {
        &mut self.viewport
    }

    /// Called once the renderer knows how many pages the document has.
    pub fn on_document_loaded(&mut self, page_count: u32) {
        log::info!("{} loaded with {page_count} page(s)", self.name);
        self.viewport.set_page_count(page_count);
    }

    /// Surface of the current page rendered at the current zoom with its
    /// top-left corner at `origin`.
    pub fn current_surface(&self, origin: ScreenPoint) -> PageSurface {
        PageSurface::new(self.viewport.page, origin, self.viewport.scale())
    }

    pub fn set_tool(&mut self, tool: Option<Tool>) {
        self.capture.set_tool(tool);
    }

    pub fn set_color(&mut self, color: Color) {
        self.capture.set_color(color);
    }

    /// With no tool active a pointer-down selects whatever is under it.
    pub fn pointer_down(&mut self, surface: &PageSurface, pointer: ScreenPoint) -> CaptureEvent {
        if self.capture.tool().is_some() {
            return self.capture.pointer_down(surface, pointer);
        }

        let hit = annotation_at(&self.store, surface.page, surface.to_page_space(pointer));
        self.store.select(hit);
        CaptureEvent::Selected(hit)
    }

    pub fn pointer_move(&mut self, surface: &PageSurface, pointer: ScreenPoint) -> CaptureEvent {
        self.capture.pointer_move(&mut self.store, surface, pointer)
    }

    pub fn pointer_up(&mut self, surface: &PageSurface, pointer: ScreenPoint) -> CaptureEvent {
        self.capture.pointer_up(&mut self.store, surface, pointer)
    }

    pub fn submit_comment(&mut self, text: Option<&str>) -> CaptureEvent {
        self.capture.submit_comment(&mut self.store, text)
    }

    pub fn save_signature(&mut self, pad: &mut dyn SignaturePad) -> CaptureEvent {
        self.capture.save_signature(&mut self.store, pad)
    }

    pub fn cancel_signature(&mut self) -> CaptureEvent {
        self.capture.cancel_signature()
    }

    /// Selects an annotation from the listing and jumps to its page.
    pub fn select_from_sidebar(&mut self, id: AnnotationId) -> bool {
        let Some(page) = self.store.get(id).map(|annotation| annotation.page()) else {
            return false;
        };

        self.store.select(Some(id));
        self.viewport.go_to_page(page);
        true
    }

    pub fn remove(&mut self, id: AnnotationId) -> bool {
        self.store.remove(id).is_some()
    }

    /// Overlay for the current page, including the live draft.
    pub fn overlay(&self) -> Vec<OverlayElement> {
        layout_page(&self.store, self.viewport.page, self.viewport.scale(), self.capture.draft())
    }

    pub fn sidebar(&self) -> Vec<SidebarEntry> {
        sidebar_entries(&self.store)
    }

    /// Bakes every annotation into a copy of the source document. Exports
    /// run one at a time; a failed export yields no file.
    pub fn export(&self) -> Result<ExportedFile, ExportError> {
        let style = ExportStyle::from(&self.config);
        let result = self.exports.run(|| export_pdf(&self.source, &self.store, &style));

        match result {
            Ok((bytes, report)) => {
                log::info!("export of {} ready as {}", self.name, self.config.output_file_name);
                Ok(ExportedFile { file_name: self.config.output_file_name.clone(), bytes, report })
            }
            Err(err) => {
                log::error!("export of {} failed: {err}", self.name);
                Err(err)
            }
        }
    }

    pub fn completed_exports(&self) -> u64 {
        self.exports.completed()
    }
}
