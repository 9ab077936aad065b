pub mod capture;
pub mod overlay;
pub mod session;
pub mod signature;
pub mod viewport;

pub use capture::{CaptureController, CaptureEvent, CaptureState, Tool};
pub use overlay::{
    annotation_at, layout_page, sidebar_entries, OverlayContent, OverlayElement, SidebarEntry,
};
pub use session::{accepts_upload, DocumentSession, Upload, PDF_MEDIA_TYPE};
pub use signature::{PendingSignature, SignatureError, SignaturePad, StrokePad};
pub use viewport::{clamp_zoom_percent, ViewportState};
