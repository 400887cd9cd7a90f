pub mod compose;
pub mod core;
pub mod generators;
pub mod models;
pub mod render;
pub mod service;
pub mod share;

// Re-export commonly used types
pub use models::{
    ExportArtifact, ExportRequest, ExportState,
    InvoiceData, InvoiceItem, InvoiceTotals,
};

pub use compose::{compose, ComposeOptions, ComposedInvoice, LayoutBlock};
pub use crate::core::{ExportError, ExportResult, PageSpec, ServiceConfig, Viewport};
pub use generators::{ExporterRegistry, InvoiceExporter, RasterPdfExporter, VectorPdfExporter};
pub use service::ExportService;
pub use share::{email_share, whatsapp_share, EmailShare};
