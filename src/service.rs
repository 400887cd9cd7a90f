use crate::compose::{compose, ComposeOptions};
use crate::core::{ExportError, ExportResult, ServiceConfig};
use crate::generators::ExporterRegistry;
use crate::models::{ExportArtifact, ExportRequest, ExportState};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

/// Coordinates invoice exports and tracks per-invoice state.
///
/// Each invoice number owns an independent state machine: Idle until an
/// export starts, Exporting while one runs, back to Idle on success and
/// Failed on error. A second request for an invoice that is already
/// Exporting is rejected; a Failed invoice can be retried right away.
pub struct ExportService {
    registry: Arc<ExporterRegistry>,
    states: Arc<Mutex<HashMap<String, ExportState>>>,
    options: ComposeOptions,
}

impl ExportService {
    pub fn new(config: &ServiceConfig) -> Self {
        Self::with_registry(Arc::new(ExporterRegistry::new()), config)
    }

    pub fn with_registry(registry: Arc<ExporterRegistry>, config: &ServiceConfig) -> Self {
        ExportService {
            registry,
            states: Arc::new(Mutex::new(HashMap::new())),
            options: ComposeOptions {
                currency_prefix: config.currency_prefix.clone(),
            },
        }
    }

    pub fn registry(&self) -> &ExporterRegistry {
        &self.registry
    }

    /// Current state for an invoice number. Unknown numbers are Idle.
    pub fn state(&self, invoice_number: &str) -> ExportState {
        let states = self
            .states
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        states
            .get(invoice_number)
            .copied()
            .unwrap_or(ExportState::Idle)
    }

    fn set_state(&self, invoice_number: &str, state: ExportState) {
        let mut states = self
            .states
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        states.insert(invoice_number.to_string(), state);
    }

    /// Claims the invoice for an export run. The lock is held for the whole
    /// check-and-set so two concurrent requests cannot both claim it.
    fn claim(&self, invoice_number: &str) -> ExportResult<()> {
        let mut states = self
            .states
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match states
            .get(invoice_number)
            .copied()
            .unwrap_or(ExportState::Idle)
        {
            ExportState::Exporting => Err(ExportError::BusyError(invoice_number.to_string())),
            ExportState::Idle | ExportState::Failed => {
                states.insert(invoice_number.to_string(), ExportState::Exporting);
                Ok(())
            }
        }
    }

    /// Runs a full export: validate, claim, compose and generate on the
    /// blocking pool, then settle the invoice state from the outcome.
    ///
    /// Validation and exporter lookup happen before the claim, so a bad
    /// request never moves the invoice out of its current state.
    pub async fn export(&self, request: &ExportRequest) -> ExportResult<ExportArtifact> {
        request.data.validate()?;

        let exporter = self.registry.get(&request.exporter_id).ok_or_else(|| {
            ExportError::ValidationError(format!("unknown exporter: {}", request.exporter_id))
        })?;

        let invoice_number = request.data.invoice_number.clone();
        self.claim(&invoice_number)?;

        info!(
            "Starting export {} for invoice {} via {} ({:?})",
            request.id, invoice_number, request.exporter_id, request.viewport
        );

        let data = request.data.clone();
        let viewport = request.viewport;
        let options = self.options.clone();
        let result = tokio::task::spawn_blocking(move || {
            let totals = data.calculate_totals();
            let doc = compose(&data, &totals, &options);
            exporter.export(&doc, viewport)
        })
        .await
        .map_err(|err| ExportError::GenerationError(format!("export task failed: {}", err)))
        .and_then(|inner| inner);

        match &result {
            Ok(artifact) => {
                info!(
                    "Export {} finished: {} ({} bytes, {} pages)",
                    request.id,
                    artifact.filename,
                    artifact.bytes.len(),
                    artifact.pages
                );
                self.set_state(&invoice_number, ExportState::Idle);
            }
            Err(err) => {
                error!(
                    "Export {} failed for invoice {}: {}",
                    request.id, invoice_number, err
                );
                self.set_state(&invoice_number, ExportState::Failed);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Viewport;
    use crate::generators::{artifact_filename, InvoiceExporter};
    use crate::compose::ComposedInvoice;
    use crate::models::{InvoiceData, InvoiceItem};
    use chrono::{NaiveDate, Utc};
    use std::time::Duration;

    struct SlowExporter;

    impl InvoiceExporter for SlowExporter {
        fn export(&self, doc: &ComposedInvoice, _viewport: Viewport) -> ExportResult<ExportArtifact> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(ExportArtifact {
                filename: artifact_filename(&doc.invoice_number),
                content_type: "application/pdf".to_string(),
                bytes: b"%PDF-stub".to_vec(),
                pages: 1,
                exporter_id: "slow_pdf".to_string(),
                generated_at: Utc::now(),
            })
        }

        fn exporter_id(&self) -> &str {
            "slow_pdf"
        }
    }

    struct FailingExporter;

    impl InvoiceExporter for FailingExporter {
        fn export(&self, _doc: &ComposedInvoice, _viewport: Viewport) -> ExportResult<ExportArtifact> {
            Err(ExportError::CaptureError("simulated failure".to_string()))
        }

        fn exporter_id(&self) -> &str {
            "failing_pdf"
        }
    }

    fn valid_invoice() -> InvoiceData {
        InvoiceData {
            invoice_number: "INV-S1".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 7, 31).unwrap(),
            from_name: "Service Co".to_string(),
            from_email: "send@service.test".to_string(),
            from_address: "1 Queue Lane".to_string(),
            to_name: "Client Inc".to_string(),
            to_email: "recv@client.test".to_string(),
            to_address: "2 Stack Road".to_string(),
            items: vec![InvoiceItem {
                id: "1".to_string(),
                name: "Work".to_string(),
                description: None,
                quantity: Some(1.0),
                rate: Some(175.0),
            }],
            notes: None,
            tax_rate: None,
            discount: None,
            logo: None,
        }
    }

    fn request(exporter_id: &str) -> ExportRequest {
        ExportRequest::new(exporter_id, Viewport::Wide, valid_invoice())
    }

    fn service_with(extra: Arc<dyn InvoiceExporter>) -> ExportService {
        let mut registry = ExporterRegistry::new();
        registry.register(extra);
        ExportService::with_registry(Arc::new(registry), &ServiceConfig::default())
    }

    #[tokio::test]
    async fn successful_export_returns_to_idle() {
        let service = ExportService::new(&ServiceConfig::default());
        assert_eq!(service.state("INV-S1"), ExportState::Idle);

        let artifact = service.export(&request("vector_pdf")).await.unwrap();
        assert!(artifact.bytes.starts_with(b"%PDF"));
        assert_eq!(artifact.filename, "Invoice-INV-S1.pdf");
        assert_eq!(service.state("INV-S1"), ExportState::Idle);
    }

    #[tokio::test]
    async fn concurrent_export_for_same_invoice_is_rejected() {
        let service = Arc::new(service_with(Arc::new(SlowExporter)));

        let first = {
            let service = service.clone();
            let request = request("slow_pdf");
            tokio::spawn(async move { service.export(&request).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(service.state("INV-S1"), ExportState::Exporting);

        match service.export(&request("slow_pdf")).await {
            Err(ExportError::BusyError(number)) => assert_eq!(number, "INV-S1"),
            other => panic!("expected busy rejection, got {:?}", other.map(|a| a.filename)),
        }

        let outcome = first.await.unwrap();
        assert!(outcome.is_ok());
        assert_eq!(service.state("INV-S1"), ExportState::Idle);
    }

    #[tokio::test]
    async fn failed_export_is_marked_and_can_be_retried() {
        let service = service_with(Arc::new(FailingExporter));

        let err = service.export(&request("failing_pdf")).await.unwrap_err();
        assert!(matches!(err, ExportError::CaptureError(_)));
        assert_eq!(service.state("INV-S1"), ExportState::Failed);

        // Retry through a working pipeline is allowed from Failed.
        let artifact = service.export(&request("vector_pdf")).await.unwrap();
        assert!(artifact.bytes.starts_with(b"%PDF"));
        assert_eq!(service.state("INV-S1"), ExportState::Idle);
    }

    #[tokio::test]
    async fn unknown_exporter_leaves_state_untouched() {
        let service = ExportService::new(&ServiceConfig::default());

        let err = service.export(&request("html_export")).await.unwrap_err();
        assert!(matches!(err, ExportError::ValidationError(_)));
        assert_eq!(service.state("INV-S1"), ExportState::Idle);
    }

    #[tokio::test]
    async fn invalid_data_is_rejected_before_claiming() {
        let service = ExportService::new(&ServiceConfig::default());
        let mut data = valid_invoice();
        data.items.clear();

        let err = service
            .export(&ExportRequest::new("vector_pdf", Viewport::Wide, data))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::ValidationError(_)));
        assert_eq!(service.state("INV-S1"), ExportState::Idle);
    }

    #[tokio::test]
    async fn states_are_tracked_per_invoice() {
        let service = service_with(Arc::new(FailingExporter));

        service.export(&request("failing_pdf")).await.unwrap_err();
        assert_eq!(service.state("INV-S1"), ExportState::Failed);
        assert_eq!(service.state("INV-OTHER"), ExportState::Idle);
    }
}
