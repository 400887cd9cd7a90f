pub mod raster;
pub mod vector;

use crate::compose::ComposedInvoice;
use crate::core::{ExportResult, Viewport};
use crate::models::ExportArtifact;
use std::collections::HashMap;
use std::sync::Arc;

pub use raster::RasterPdfExporter;
pub use vector::VectorPdfExporter;

/// Contrato común de los pipelines de exportación. Ambas implementaciones
/// parten del mismo documento compuesto; el artefacto debe ser un PDF válido
/// sea cual sea el pipeline elegido.
pub trait InvoiceExporter: Send + Sync {
    /// Genera el artefacto descargable para el documento dado.
    fn export(&self, doc: &ComposedInvoice, viewport: Viewport) -> ExportResult<ExportArtifact>;

    /// Identificador estable con el que se registra el exportador.
    fn exporter_id(&self) -> &str;

    /// Descripción corta para listados.
    fn description(&self) -> &str {
        "Invoice PDF exporter"
    }
}

/// Registro de exportadores disponibles, indexados por identificador.
pub struct ExporterRegistry {
    exporters: HashMap<String, Arc<dyn InvoiceExporter>>,
}

impl ExporterRegistry {
    pub fn new() -> Self {
        let mut registry = ExporterRegistry {
            exporters: HashMap::new(),
        };
        registry.register(Arc::new(RasterPdfExporter));
        registry.register(Arc::new(VectorPdfExporter));
        registry
    }

    pub fn register(&mut self, exporter: Arc<dyn InvoiceExporter>) {
        self.exporters
            .insert(exporter.exporter_id().to_string(), exporter);
    }

    pub fn get(&self, exporter_id: &str) -> Option<Arc<dyn InvoiceExporter>> {
        self.exporters.get(exporter_id).cloned()
    }

    pub fn exists(&self, exporter_id: &str) -> bool {
        self.exporters.contains_key(exporter_id)
    }

    pub fn list_exporters(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.exporters.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for ExporterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Nombre del archivo descargado. El número de factura se interpola tal
/// cual, sin sanitizar: es un dato del usuario y se respeta verbatim.
pub fn artifact_filename(invoice_number: &str) -> String {
    format!("Invoice-{}.pdf", invoice_number)
}
