pub mod annotation;
pub mod color;
pub mod config;
pub mod geometry;
pub mod store;

pub use annotation::{
    Annotation, AnnotationBody, AnnotationId, AnnotationKind, SignatureDataError, SignatureImage,
};
pub use color::{Color, ColorParseError};
pub use config::AnnotatorConfig;
pub use geometry::{
    to_export_point, to_export_rect, to_page_space, ExportPoint, ExportRect, PagePoint, PageRect,
    PageSurface, ScreenPoint,
};
pub use store::AnnotationStore;
