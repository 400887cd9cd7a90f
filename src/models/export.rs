use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::InvoiceData;
use crate::core::config::Viewport;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub exporter_id: String,
    pub viewport: Viewport,
    pub data: InvoiceData,
}

impl ExportRequest {
    pub fn new(exporter_id: impl Into<String>, viewport: Viewport, data: InvoiceData) -> Self {
        ExportRequest {
            id: Uuid::new_v4(),
            exporter_id: exporter_id.into(),
            viewport,
            data,
        }
    }
}

/// Estado de exportación por documento. Una segunda solicitud mientras el
/// documento está en Exporting se rechaza; desde Failed se permite reintentar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportState {
    Idle,
    Exporting,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub pages: usize,
    pub exporter_id: String,
    pub generated_at: DateTime<Utc>,
}
