//! Pipeline vectorial: dibuja texto y líneas nativas sobre una única página
//! A4 con fuentes incorporadas. No pagina: el contenido que no cabe queda
//! fuera del área visible de la página.

use crate::compose::{
    AddressBlock, ComposedInvoice, HeaderBlock, ItemTableBlock, LayoutBlock, NotesBlock, Party,
    TotalsBlock,
};
use crate::core::format::wrap_line;
use crate::core::{ExportError, ExportResult, PageSpec, Viewport};
use crate::generators::{artifact_filename, InvoiceExporter};
use crate::models::ExportArtifact;
use chrono::Utc;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Point};
use std::io::BufWriter;

const LEFT: f32 = 15.0;
const RIGHT: f32 = 195.0;
const DATE_X: f32 = 130.0;
const BILL_TO_X: f32 = 110.0;
const QTY_X: f32 = 118.0;
const RATE_X: f32 = 140.0;
const AMOUNT_X: f32 = 170.0;
const LABEL_X: f32 = 130.0;
const VALUE_X: f32 = 168.0;
const NOTE_WRAP: usize = 95;

pub struct VectorPdfExporter;

impl InvoiceExporter for VectorPdfExporter {
    fn export(&self, doc: &ComposedInvoice, _viewport: Viewport) -> ExportResult<ExportArtifact> {
        let page = PageSpec::a4();
        let (pdf, first_page, first_layer) = PdfDocument::new(
            format!("Invoice {}", doc.invoice_number),
            Mm(page.width),
            Mm(page.height),
            "Layer 1",
        );
        let layer = pdf.get_page(first_page).get_layer(first_layer);

        let font = pdf
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|err| ExportError::GenerationError(err.to_string()))?;
        let font_bold = pdf
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|err| ExportError::GenerationError(err.to_string()))?;

        let mut y = 282.0_f32;
        for block in &doc.blocks {
            y = match block {
                LayoutBlock::Header(header) => draw_header(&layer, &font, &font_bold, header, y),
                LayoutBlock::Addresses(addresses) => {
                    draw_addresses(&layer, &font, &font_bold, addresses, y)
                }
                LayoutBlock::ItemTable(table) => draw_items(&layer, &font, &font_bold, table, y),
                LayoutBlock::Totals(totals) => draw_totals(&layer, &font, &font_bold, totals, y),
                LayoutBlock::Notes(notes) => draw_notes(&layer, &font, &font_bold, notes, y),
            };
        }

        let mut writer = BufWriter::new(Vec::<u8>::new());
        pdf.save(&mut writer)
            .map_err(|err| ExportError::EncodeError(err.to_string()))?;
        let bytes = writer
            .into_inner()
            .map_err(|err| ExportError::EncodeError(err.to_string()))?;

        Ok(ExportArtifact {
            filename: artifact_filename(&doc.invoice_number),
            content_type: "application/pdf".to_string(),
            bytes,
            pages: 1,
            exporter_id: self.exporter_id().to_string(),
            generated_at: Utc::now(),
        })
    }

    fn exporter_id(&self) -> &str {
        "vector_pdf"
    }

    fn description(&self) -> &str {
        "Draws the invoice with native text and vector rules on a single A4 page"
    }
}

fn push_line(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    font_size: f32,
    x: f32,
    y: f32,
) {
    layer.use_text(text, font_size, Mm(x), Mm(y), font);
}

fn draw_rule(layer: &PdfLayerReference, x1: f32, x2: f32, y: f32) {
    layer.add_line(printpdf::Line {
        points: vec![
            (Point::new(Mm(x1), Mm(y)), false),
            (Point::new(Mm(x2), Mm(y)), false),
        ],
        is_closed: false,
    });
}

fn draw_box(layer: &PdfLayerReference, x1: f32, y1: f32, x2: f32, y2: f32) {
    layer.add_line(printpdf::Line {
        points: vec![
            (Point::new(Mm(x1), Mm(y1)), false),
            (Point::new(Mm(x2), Mm(y1)), false),
            (Point::new(Mm(x2), Mm(y2)), false),
            (Point::new(Mm(x1), Mm(y2)), false),
        ],
        is_closed: true,
    });
}

fn draw_header(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    font_bold: &IndirectFontRef,
    header: &HeaderBlock,
    y: f32,
) -> f32 {
    push_line(layer, font_bold, &header.title, 22.0, LEFT, y - 4.0);
    push_line(layer, font, &header.invoice_number, 11.0, LEFT, y - 12.0);

    let mut right_y = y;
    if header.logo.is_some() {
        // El logo llega como data-URL; se reserva su sitio con un recuadro.
        draw_box(layer, 170.0, y - 8.0, RIGHT, y + 2.0);
        right_y -= 14.0;
    }
    push_line(layer, font, &header.issue_line, 10.0, DATE_X, right_y - 4.0);
    push_line(layer, font, &header.due_line, 10.0, DATE_X, right_y - 9.0);

    let next = (y - 18.0).min(right_y - 13.0);
    draw_rule(layer, LEFT, RIGHT, next);
    next - 8.0
}

fn draw_party(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    font_bold: &IndirectFontRef,
    party: &Party,
    x: f32,
    y: f32,
) -> f32 {
    let mut y = y;
    push_line(layer, font_bold, &party.heading, 11.0, x, y);
    y -= 6.0;
    push_line(layer, font_bold, &party.name, 10.0, x, y);
    y -= 5.0;
    push_line(layer, font, &party.email, 9.0, x, y);
    y -= 5.0;
    for line in &party.address_lines {
        push_line(layer, font, line, 9.0, x, y);
        y -= 4.5;
    }
    y
}

fn draw_addresses(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    font_bold: &IndirectFontRef,
    addresses: &AddressBlock,
    y: f32,
) -> f32 {
    let left = draw_party(layer, font, font_bold, &addresses.from, LEFT, y);
    let right = draw_party(layer, font, font_bold, &addresses.to, BILL_TO_X, y);
    left.min(right) - 8.0
}

fn draw_items(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    font_bold: &IndirectFontRef,
    table: &ItemTableBlock,
    y: f32,
) -> f32 {
    let mut y = y;
    push_line(layer, font_bold, &table.headers[0], 10.0, LEFT, y);
    push_line(layer, font_bold, &table.headers[1], 10.0, QTY_X, y);
    push_line(layer, font_bold, &table.headers[2], 10.0, RATE_X, y);
    push_line(layer, font_bold, &table.headers[3], 10.0, AMOUNT_X, y);
    y -= 3.0;
    draw_rule(layer, LEFT, RIGHT, y);
    y -= 6.0;

    for row in &table.rows {
        push_line(layer, font, &row.name, 10.0, LEFT, y);
        push_line(layer, font, &row.quantity, 10.0, QTY_X, y);
        push_line(layer, font, &row.rate, 10.0, RATE_X, y);
        push_line(layer, font_bold, &row.amount, 10.0, AMOUNT_X, y);
        y -= 5.0;
        if !row.description.is_empty() {
            push_line(layer, font, &row.description, 8.0, LEFT + 2.0, y);
            y -= 4.5;
        }
        y -= 1.0;
    }

    y -= 2.0;
    draw_rule(layer, LEFT, RIGHT, y);
    y - 8.0
}

fn draw_totals(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    font_bold: &IndirectFontRef,
    totals: &TotalsBlock,
    y: f32,
) -> f32 {
    let mut y = y;
    for row in &totals.rows {
        if row.emphasis {
            y -= 1.0;
            draw_rule(layer, LABEL_X, RIGHT, y + 4.0);
            push_line(layer, font_bold, &row.label, 12.0, LABEL_X, y);
            push_line(layer, font_bold, &row.value, 12.0, VALUE_X, y);
            y -= 8.0;
        } else {
            push_line(layer, font, &row.label, 10.0, LABEL_X, y);
            push_line(layer, font, &row.value, 10.0, VALUE_X, y);
            y -= 6.0;
        }
    }
    y - 4.0
}

fn draw_notes(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    font_bold: &IndirectFontRef,
    notes: &NotesBlock,
    y: f32,
) -> f32 {
    let mut y = y;
    push_line(layer, font_bold, &notes.heading, 11.0, LEFT, y);
    y -= 6.0;
    for line in &notes.lines {
        for piece in wrap_line(line, NOTE_WRAP) {
            push_line(layer, font, &piece, 9.0, LEFT, y);
            y -= 4.5;
        }
    }
    y
}
