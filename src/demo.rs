use anyhow::Result;
use chrono::NaiveDate;
use invoice_exporter::{
    whatsapp_share, ExportRequest, ExportService, InvoiceData, InvoiceItem, ServiceConfig,
    Viewport,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("🧾 Demo de Exportación de Facturas");
    println!("==================================\n");

    tokio::fs::create_dir_all("output").await?;

    let config = ServiceConfig::from_env();
    let service = ExportService::new(&config);
    let invoice = sample_invoice();

    println!("📄 Generando PDFs con ambos pipelines y viewports...");
    for exporter_id in ["raster_pdf", "vector_pdf"] {
        for viewport in [Viewport::Wide, Viewport::Narrow] {
            let mut data = invoice.clone();
            data.invoice_number =
                format!("{}-{}-{:?}", invoice.invoice_number, exporter_id, viewport);

            let request = ExportRequest::new(exporter_id, viewport, data);
            let artifact = service.export(&request).await?;

            let path = format!("output/{}", artifact.filename);
            tokio::fs::write(&path, &artifact.bytes).await?;
            println!(
                "  ✓ Generado: {} ({} bytes, {} páginas)",
                path,
                artifact.bytes.len(),
                artifact.pages
            );
        }
    }

    println!("\n📨 Texto para compartir por WhatsApp:\n");
    let totals = invoice.calculate_totals();
    println!("{}", whatsapp_share(&invoice, &totals, &config.currency_prefix));

    println!("\n✅ Artefactos generados en la carpeta 'output/'");
    Ok(())
}

fn sample_invoice() -> InvoiceData {
    InvoiceData {
        invoice_number: "INV-2026-001".to_string(),
        invoice_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
        due_date: NaiveDate::from_ymd_opt(2026, 8, 31).unwrap(),
        from_name: "Blue Lotus Studio".to_string(),
        from_email: "billing@bluelotus.example".to_string(),
        from_address: "14 Marine Drive\nMumbai 400020".to_string(),
        to_name: "Horizon Traders".to_string(),
        to_email: "accounts@horizon.example".to_string(),
        to_address: "221 MG Road\nBengaluru 560001".to_string(),
        items: vec![
            InvoiceItem {
                id: "1".to_string(),
                name: "Brand identity design".to_string(),
                description: Some("Logo, palette and typography".to_string()),
                quantity: Some(1.0),
                rate: Some(45_000.0),
            },
            InvoiceItem {
                id: "2".to_string(),
                name: "Website development".to_string(),
                description: None,
                quantity: Some(1.0),
                rate: Some(120_000.0),
            },
            InvoiceItem {
                id: "3".to_string(),
                name: "Maintenance retainer".to_string(),
                description: Some("Three months".to_string()),
                quantity: Some(3.0),
                rate: Some(8_500.0),
            },
        ],
        notes: Some(
            "Payment by bank transfer within 15 days. Please reference the invoice number."
                .to_string(),
        ),
        tax_rate: Some(18.0),
        discount: Some(10.0),
        logo: None,
    }
}
