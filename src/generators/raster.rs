//! Pipeline raster: captura la factura como imagen y la incrusta en un PDF A4.
//!
//! La geometría se decide en milímetros a partir de la relación de aspecto de
//! la captura. En viewport ancho el contenido que desborda se reparte en
//! varias páginas desplazando la misma imagen hacia arriba; en angosto se
//! reescala de manera uniforme para caber en una sola página.

use crate::compose::ComposedInvoice;
use crate::core::{ExportError, ExportResult, PageSpec, Viewport};
use crate::generators::{artifact_filename, InvoiceExporter};
use crate::models::ExportArtifact;
use crate::render::render_capture;
use chrono::Utc;
use image::DynamicImage;
use printpdf::{Image, ImageTransform, Mm, PdfDocument};
use std::io::BufWriter;

const MM_PER_INCH: f32 = 25.4;

/// Geometría de paginación derivada de la relación de aspecto y el viewport.
/// Los desplazamientos son la coordenada superior de la imagen en cada
/// página, en mm descendentes; a partir de la segunda página son negativos.
#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    pub pages: usize,
    pub content_width: f32,
    pub content_height: f32,
    pub displayed_height: f32,
    pub top_offsets: Vec<f32>,
}

impl PagePlan {
    /// Resolución que hace que la imagen ocupe exactamente la geometría
    /// planificada. Cuando hubo reescalado, manda el alto; si no, el ancho.
    pub fn dpi_for(&self, width_px: u32, height_px: u32) -> f32 {
        if self.displayed_height < self.content_height {
            height_px as f32 * MM_PER_INCH / self.displayed_height
        } else {
            width_px as f32 * MM_PER_INCH / self.content_width
        }
    }

    /// Traslación vertical printpdf (origen abajo-izquierda) para la página k.
    pub fn translate_y(&self, page_index: usize, page: &PageSpec) -> f32 {
        page.height - self.top_offsets[page_index] - self.displayed_height
    }
}

/// El contenido ocupa siempre el ancho útil; el alto sale del aspecto.
/// Si no cabe en una página: en ancho se pagina con `ceil`, en angosto se
/// reescala al alto útil y queda en una sola página.
pub fn plan_pages(aspect: f32, viewport: Viewport) -> PagePlan {
    let page = PageSpec::a4();
    let margin = viewport.margin();
    let content_width = page.content_width(margin);
    let usable = page.usable_height(margin);
    let content_height = content_width * aspect;

    if content_height <= usable {
        return PagePlan {
            pages: 1,
            content_width,
            content_height,
            displayed_height: content_height,
            top_offsets: vec![margin],
        };
    }

    match viewport {
        Viewport::Wide => {
            let pages = (content_height / usable).ceil() as usize;
            let top_offsets = (0..pages)
                .map(|k| margin - usable * k as f32)
                .collect();
            PagePlan {
                pages,
                content_width,
                content_height,
                displayed_height: content_height,
                top_offsets,
            }
        }
        Viewport::Narrow => PagePlan {
            pages: 1,
            content_width,
            content_height,
            displayed_height: usable,
            top_offsets: vec![margin],
        },
    }
}

pub struct RasterPdfExporter;

impl InvoiceExporter for RasterPdfExporter {
    fn export(&self, doc: &ComposedInvoice, viewport: Viewport) -> ExportResult<ExportArtifact> {
        let capture = render_capture(doc, viewport)?;
        let plan = plan_pages(capture.aspect_ratio(), viewport);
        let page = PageSpec::a4();
        let margin = viewport.margin();
        let dpi = plan.dpi_for(capture.width_px(), capture.height_px());

        let (pdf, first_page, first_layer) = PdfDocument::new(
            format!("Invoice {}", doc.invoice_number),
            Mm(page.width),
            Mm(page.height),
            "Layer 1",
        );

        let dynamic = DynamicImage::ImageRgb8(capture.image);
        let mut layer = pdf.get_page(first_page).get_layer(first_layer);

        for page_index in 0..plan.pages {
            if page_index > 0 {
                let (next_page, next_layer) = pdf.add_page(
                    Mm(page.width),
                    Mm(page.height),
                    format!("Page {}, Layer 1", page_index + 1),
                );
                layer = pdf.get_page(next_page).get_layer(next_layer);
            }

            let embedded = Image::from_dynamic_image(&dynamic);
            embedded.add_to_layer(
                layer.clone(),
                ImageTransform {
                    translate_x: Some(Mm(margin)),
                    translate_y: Some(Mm(plan.translate_y(page_index, &page))),
                    dpi: Some(dpi),
                    ..Default::default()
                },
            );
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
            pages: plan.pages,
            exporter_id: self.exporter_id().to_string(),
            generated_at: Utc::now(),
        })
    }

    fn exporter_id(&self) -> &str {
        "raster_pdf"
    }

    fn description(&self) -> &str {
        "Captures the invoice as an image and tiles it onto A4 pages"
    }
}
