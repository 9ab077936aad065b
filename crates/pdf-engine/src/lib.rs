use doc_model::{Color, ExportPoint, ExportRect};

pub mod export;
mod lopdf_writer;

pub use export::{
    encode_annotations, export_pdf, export_with, ExportCoordinator, ExportError, ExportReport,
    ExportStyle, ExportedFile, SkipReason, SkippedAnnotation,
};
pub use lopdf_writer::LopdfWriter;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl Default for PageSize {
    fn default() -> Self {
        Self { width_pt: 612.0, height_pt: 792.0 }
    }
}

/// Image resource embedded into a loaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(usize);

impl ImageHandle {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PdfEngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("encrypted PDFs are not supported in the default backend")]
    EncryptedUnsupported,
    #[error("invalid image handle {0}")]
    InvalidImage(usize),
    #[error("image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Mutating view of a loaded document. Page indices are 0-based and all
/// coordinates are in export space (bottom-left origin, unscaled points).
pub trait DocumentWriter {
    fn page_count(&self) -> u32;
    fn page_size(&self, page_index: u32) -> Result<PageSize, PdfEngineError>;
    fn draw_rectangle(
        &mut self,
        page_index: u32,
        rect: ExportRect,
        fill: Color,
        opacity: f32,
    ) -> Result<(), PdfEngineError>;
    fn draw_text(
        &mut self,
        page_index: u32,
        text: &str,
        origin: ExportPoint,
        size: f32,
        fill: Color,
    ) -> Result<(), PdfEngineError>;
    fn embed_image(&mut self, bytes: &[u8]) -> Result<ImageHandle, PdfEngineError>;
    fn draw_image(
        &mut self,
        page_index: u32,
        image: ImageHandle,
        rect: ExportRect,
    ) -> Result<(), PdfEngineError>;
    fn save(&mut self) -> Result<Vec<u8>, PdfEngineError>;
}
