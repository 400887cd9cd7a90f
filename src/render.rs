//! Captura determinista de la factura compuesta como imagen RGB.
//!
//! El pipeline raster no dibuja texto en el PDF: primero traza el documento
//! sobre un lienzo lógico (`lay_out`), luego lo rasteriza a la escala del
//! viewport (`rasterize`) y el exportador incrusta la imagen resultante.

use crate::compose::{
    AddressBlock, ComposedInvoice, HeaderBlock, ItemTableBlock, LayoutBlock, NotesBlock, Party,
    TotalsBlock,
};
use crate::core::format::wrap_line;
use crate::core::{ExportError, ExportResult, Viewport};
use image::{Rgb, RgbImage};

/// Ancho lógico del lienzo por viewport, en píxeles.
pub const CANVAS_WIDTH_WIDE: u32 = 800;
pub const CANVAS_WIDTH_NARROW: u32 = 480;

/// Límite duro de un lienzo de captura en cualquiera de sus dimensiones.
pub const MAX_CAPTURE_DIM: u32 = 32_767;

const GLYPH_HEIGHT: u32 = 7;
const GLYPH_ADVANCE: u32 = 6;
const SECTION_GAP: u32 = 24;

const INK: Rgb<u8> = Rgb([17, 24, 39]);
const MUTED: Rgb<u8> = Rgb([107, 114, 128]);
const RULE: Rgb<u8> = Rgb([229, 231, 235]);
const PANEL: Rgb<u8> = Rgb([249, 250, 251]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Primitivas de dibujo en coordenadas lógicas (origen arriba-izquierda).
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Text {
        x: u32,
        y: u32,
        scale: u32,
        bold: bool,
        muted: bool,
        text: String,
    },
    Rule {
        x: u32,
        y: u32,
        width: u32,
    },
    Panel {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    Frame {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

/// Resultado de la fase de trazado: comandos más la geometría lógica final.
/// El alto depende del contenido; el ancho solo del viewport.
#[derive(Debug, Clone)]
pub struct CaptureLayout {
    pub commands: Vec<DrawCommand>,
    pub width: u32,
    pub height: u32,
}

struct Canvas {
    width: u32,
    pad: u32,
    bottom: u32,
    commands: Vec<DrawCommand>,
}

impl Canvas {
    fn new(width: u32, pad: u32) -> Self {
        Canvas {
            width,
            pad,
            bottom: 0,
            commands: Vec::new(),
        }
    }

    fn inner_right(&self) -> u32 {
        self.width - self.pad
    }

    fn text(&mut self, x: u32, y: u32, scale: u32, bold: bool, muted: bool, text: &str) {
        self.bottom = self.bottom.max(y + GLYPH_HEIGHT * scale);
        self.commands.push(DrawCommand::Text {
            x,
            y,
            scale,
            bold,
            muted,
            text: text.to_string(),
        });
    }

    fn text_right(&mut self, right: u32, y: u32, scale: u32, bold: bool, muted: bool, text: &str) {
        let x = right.saturating_sub(text_width(text, scale));
        self.text(x, y, scale, bold, muted, text);
    }

    fn rule(&mut self, x: u32, y: u32, width: u32) {
        self.bottom = self.bottom.max(y + 1);
        self.commands.push(DrawCommand::Rule { x, y, width });
    }

    fn panel(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.bottom = self.bottom.max(y + height);
        self.commands.push(DrawCommand::Panel {
            x,
            y,
            width,
            height,
        });
    }

    fn frame(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.bottom = self.bottom.max(y + height);
        self.commands.push(DrawCommand::Frame {
            x,
            y,
            width,
            height,
        });
    }

    fn finish(self) -> CaptureLayout {
        CaptureLayout {
            width: self.width,
            height: self.bottom + self.pad,
            commands: self.commands,
        }
    }
}

pub fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH_ADVANCE * scale
}

fn line_height(scale: u32) -> u32 {
    GLYPH_HEIGHT * scale + 6
}

/// Traza el documento completo y devuelve los comandos junto con la
/// geometría lógica. Puro: mismo documento y viewport, mismo trazado.
pub fn lay_out(doc: &ComposedInvoice, viewport: Viewport) -> CaptureLayout {
    let (width, pad) = match viewport {
        Viewport::Wide => (CANVAS_WIDTH_WIDE, 40),
        Viewport::Narrow => (CANVAS_WIDTH_NARROW, 24),
    };
    let mut canvas = Canvas::new(width, pad);
    let mut y = pad;

    for block in &doc.blocks {
        y = match block {
            LayoutBlock::Header(header) => layout_header(&mut canvas, header, y),
            LayoutBlock::Addresses(addresses) => {
                layout_addresses(&mut canvas, addresses, y, viewport)
            }
            LayoutBlock::ItemTable(table) => layout_items(&mut canvas, table, y, viewport),
            LayoutBlock::Totals(totals) => layout_totals(&mut canvas, totals, y, viewport),
            LayoutBlock::Notes(notes) => layout_notes(&mut canvas, notes, y),
        };
    }

    canvas.finish()
}

fn layout_header(canvas: &mut Canvas, header: &HeaderBlock, top: u32) -> u32 {
    canvas.text(canvas.pad, top, 4, true, false, &header.title);
    let mut left_y = top + GLYPH_HEIGHT * 4 + 10;
    canvas.text(canvas.pad, left_y, 2, false, true, &header.invoice_number);
    left_y += line_height(2);

    let mut right_y = top;
    if header.logo.is_some() {
        // El logo llega como data-URL; la captura lo marca con un recuadro.
        let (logo_w, logo_h) = (96, 40);
        canvas.frame(canvas.inner_right() - logo_w, right_y, logo_w, logo_h);
        right_y += logo_h + 10;
    }
    canvas.text_right(canvas.inner_right(), right_y, 2, false, false, &header.issue_line);
    right_y += line_height(2);
    canvas.text_right(canvas.inner_right(), right_y, 2, false, false, &header.due_line);
    right_y += line_height(2);

    let y = left_y.max(right_y) + 10;
    canvas.rule(canvas.pad, y, canvas.width - 2 * canvas.pad);
    y + SECTION_GAP
}

fn layout_party(canvas: &mut Canvas, party: &Party, x: u32, top: u32) -> u32 {
    let mut y = top;
    canvas.text(x, y, 2, false, true, &party.heading);
    y += line_height(2);
    canvas.text(x, y, 2, true, false, &party.name);
    y += line_height(2);
    canvas.text(x, y, 2, false, true, &party.email);
    y += line_height(2);
    for line in &party.address_lines {
        canvas.text(x, y, 2, false, false, line);
        y += line_height(2);
    }
    y
}

/// En viewport ancho las direcciones van en dos columnas; en angosto se
/// apilan, por eso la captura angosta sale proporcionalmente más alta.
fn layout_addresses(
    canvas: &mut Canvas,
    addresses: &AddressBlock,
    top: u32,
    viewport: Viewport,
) -> u32 {
    match viewport {
        Viewport::Wide => {
            let left = layout_party(canvas, &addresses.from, canvas.pad, top);
            let mid = canvas.width / 2;
            let right = layout_party(canvas, &addresses.to, mid, top);
            left.max(right) + SECTION_GAP
        }
        Viewport::Narrow => {
            let after_from = layout_party(canvas, &addresses.from, canvas.pad, top);
            let after_to = layout_party(canvas, &addresses.to, canvas.pad, after_from + 16);
            after_to + SECTION_GAP
        }
    }
}

struct TableColumns {
    name_x: u32,
    quantity_right: u32,
    rate_right: u32,
    amount_right: u32,
}

fn table_columns(canvas: &Canvas, viewport: Viewport) -> TableColumns {
    match viewport {
        Viewport::Wide => TableColumns {
            name_x: canvas.pad,
            quantity_right: 490,
            rate_right: 620,
            amount_right: canvas.inner_right(),
        },
        Viewport::Narrow => TableColumns {
            name_x: canvas.pad,
            quantity_right: 235,
            rate_right: 340,
            amount_right: canvas.inner_right(),
        },
    }
}

fn layout_items(
    canvas: &mut Canvas,
    table: &ItemTableBlock,
    top: u32,
    viewport: Viewport,
) -> u32 {
    let columns = table_columns(canvas, viewport);
    let inner_width = canvas.width - 2 * canvas.pad;
    let mut y = top;

    canvas.panel(canvas.pad, y, inner_width, line_height(2) + 8);
    let header_y = y + 4;
    canvas.text(columns.name_x + 6, header_y, 2, true, true, &table.headers[0]);
    canvas.text_right(columns.quantity_right, header_y, 2, true, true, &table.headers[1]);
    canvas.text_right(columns.rate_right, header_y, 2, true, true, &table.headers[2]);
    canvas.text_right(columns.amount_right - 6, header_y, 2, true, true, &table.headers[3]);
    y += line_height(2) + 14;

    for row in &table.rows {
        canvas.text(columns.name_x, y, 2, false, false, &row.name);
        canvas.text_right(columns.quantity_right, y, 2, false, false, &row.quantity);
        canvas.text_right(columns.rate_right, y, 2, false, false, &row.rate);
        canvas.text_right(columns.amount_right, y, 2, false, false, &row.amount);
        y += line_height(2);
        if !row.description.is_empty() {
            canvas.text(columns.name_x, y, 1, false, true, &row.description);
            y += line_height(1);
        }
        y += 4;
        canvas.rule(canvas.pad, y, inner_width);
        y += 10;
    }

    y + SECTION_GAP - 10
}

fn layout_totals(
    canvas: &mut Canvas,
    totals: &TotalsBlock,
    top: u32,
    viewport: Viewport,
) -> u32 {
    let box_width = match viewport {
        Viewport::Wide => 280,
        Viewport::Narrow => 240,
    };
    let right = canvas.inner_right();
    let label_x = right - box_width;
    let mut y = top;

    for row in &totals.rows {
        if row.emphasis {
            canvas.rule(label_x, y, box_width);
            y += 10;
        }
        canvas.text(label_x, y, 2, row.emphasis, !row.emphasis, &row.label);
        canvas.text_right(right, y, 2, row.emphasis, false, &row.value);
        y += line_height(2);
    }

    y + SECTION_GAP
}

fn layout_notes(canvas: &mut Canvas, notes: &NotesBlock, top: u32) -> u32 {
    let max_chars = ((canvas.width - 2 * canvas.pad) / (GLYPH_ADVANCE * 2)) as usize;
    let mut y = top;

    canvas.text(canvas.pad, y, 2, true, false, &notes.heading);
    y += line_height(2) + 2;
    for line in &notes.lines {
        for wrapped in wrap_line(line, max_chars) {
            canvas.text(canvas.pad, y, 2, false, true, &wrapped);
            y += line_height(2);
        }
    }

    y + SECTION_GAP
}

/// Imagen capturada junto con la escala que la produjo. El alto y el ancho
/// en píxeles ya incluyen la escala; la relación de aspecto no depende de ella.
#[derive(Debug, Clone)]
pub struct Capture {
    pub image: RgbImage,
    pub scale: u32,
}

impl Capture {
    pub fn width_px(&self) -> u32 {
        self.image.width()
    }

    pub fn height_px(&self) -> u32 {
        self.image.height()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.image.height() as f32 / self.image.width() as f32
    }
}

/// Traza y rasteriza en un paso. Falla con `CaptureError` si el lienzo
/// resultante supera `MAX_CAPTURE_DIM` en alguna dimensión.
pub fn render_capture(doc: &ComposedInvoice, viewport: Viewport) -> ExportResult<Capture> {
    let layout = lay_out(doc, viewport);
    let scale = viewport.capture_scale();
    let width_px = layout.width * scale;
    let height_px = layout.height * scale;

    if width_px > MAX_CAPTURE_DIM || height_px > MAX_CAPTURE_DIM {
        return Err(ExportError::CaptureError(format!(
            "canvas of {}x{} px exceeds the {} px limit",
            width_px, height_px, MAX_CAPTURE_DIM
        )));
    }

    Ok(Capture {
        image: rasterize(&layout, scale),
        scale,
    })
}

pub fn rasterize(layout: &CaptureLayout, scale: u32) -> RgbImage {
    let mut image = RgbImage::from_pixel(layout.width * scale, layout.height * scale, WHITE);

    for command in &layout.commands {
        match command {
            DrawCommand::Text {
                x,
                y,
                scale: glyph_scale,
                bold,
                muted,
                text,
            } => {
                let color = if *muted { MUTED } else { INK };
                draw_text(&mut image, x * scale, y * scale, glyph_scale * scale, *bold, color, text);
            }
            DrawCommand::Rule { x, y, width } => {
                fill_rect(&mut image, x * scale, y * scale, width * scale, scale, RULE);
            }
            DrawCommand::Panel {
                x,
                y,
                width,
                height,
            } => {
                fill_rect(&mut image, x * scale, y * scale, width * scale, height * scale, PANEL);
            }
            DrawCommand::Frame {
                x,
                y,
                width,
                height,
            } => {
                let (x, y) = (x * scale, y * scale);
                let (w, h) = (width * scale, height * scale);
                fill_rect(&mut image, x, y, w, scale, RULE);
                fill_rect(&mut image, x, y + h - scale, w, scale, RULE);
                fill_rect(&mut image, x, y, scale, h, RULE);
                fill_rect(&mut image, x + w - scale, y, scale, h, RULE);
            }
        }
    }

    image
}

fn fill_rect(image: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
    let x_end = (x + width).min(image.width());
    let y_end = (y + height).min(image.height());
    for py in y..y_end {
        for px in x..x_end {
            image.put_pixel(px, py, color);
        }
    }
}

fn draw_text(
    image: &mut RgbImage,
    x: u32,
    y: u32,
    dot: u32,
    bold: bool,
    color: Rgb<u8>,
    text: &str,
) {
    let mut cursor = x;
    for ch in text.chars() {
        let columns = glyph_columns(ch);
        for (col, bits) in columns.iter().enumerate() {
            for row in 0..GLYPH_HEIGHT {
                if bits & (1 << row) != 0 {
                    let px = cursor + col as u32 * dot;
                    let py = y + row * dot;
                    fill_rect(image, px, py, dot, dot, color);
                    if bold {
                        fill_rect(image, px + 1, py, dot, dot, color);
                    }
                }
            }
        }
        cursor += GLYPH_ADVANCE * dot;
    }
}

fn glyph_columns(ch: char) -> [u8; 5] {
    let index = (ch as usize).wrapping_sub(32);
    if index < FONT_5X7.len() {
        FONT_5X7[index]
    } else {
        FONT_5X7[('?' as usize) - 32]
    }
}

// Fuente 5x7 clásica de dominio público para ASCII 32..=126.
// Cada byte es una columna; el bit 0 es la fila superior.
const FONT_5X7: [[u8; 5]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // espacio
    [0x00, 0x00, 0x5F, 0x00, 0x00], // !
    [0x00, 0x07, 0x00, 0x07, 0x00], // "
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // #
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // $
    [0x23, 0x13, 0x08, 0x64, 0x62], // %
    [0x36, 0x49, 0x55, 0x22, 0x50], // &
    [0x00, 0x05, 0x03, 0x00, 0x00], // '
    [0x00, 0x1C, 0x22, 0x41, 0x00], // (
    [0x00, 0x41, 0x22, 0x1C, 0x00], // )
    [0x08, 0x2A, 0x1C, 0x2A, 0x08], // *
    [0x08, 0x08, 0x3E, 0x08, 0x08], // +
    [0x00, 0x50, 0x30, 0x00, 0x00], // ,
    [0x08, 0x08, 0x08, 0x08, 0x08], // -
    [0x00, 0x60, 0x60, 0x00, 0x00], // .
    [0x20, 0x10, 0x08, 0x04, 0x02], // /
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // 0
    [0x00, 0x42, 0x7F, 0x40, 0x00], // 1
    [0x42, 0x61, 0x51, 0x49, 0x46], // 2
    [0x21, 0x41, 0x45, 0x4B, 0x31], // 3
    [0x18, 0x14, 0x12, 0x7F, 0x10], // 4
    [0x27, 0x45, 0x45, 0x45, 0x39], // 5
    [0x3C, 0x4A, 0x49, 0x49, 0x30], // 6
    [0x01, 0x71, 0x09, 0x05, 0x03], // 7
    [0x36, 0x49, 0x49, 0x49, 0x36], // 8
    [0x06, 0x49, 0x49, 0x29, 0x1E], // 9
    [0x00, 0x36, 0x36, 0x00, 0x00], // :
    [0x00, 0x56, 0x36, 0x00, 0x00], // ;
    [0x00, 0x08, 0x14, 0x22, 0x41], // <
    [0x14, 0x14, 0x14, 0x14, 0x14], // =
    [0x41, 0x22, 0x14, 0x08, 0x00], // >
    [0x02, 0x01, 0x51, 0x09, 0x06], // ?
    [0x32, 0x49, 0x79, 0x41, 0x3E], // @
    [0x7E, 0x11, 0x11, 0x11, 0x7E], // A
    [0x7F, 0x49, 0x49, 0x49, 0x36], // B
    [0x3E, 0x41, 0x41, 0x41, 0x22], // C
    [0x7F, 0x41, 0x41, 0x22, 0x1C], // D
    [0x7F, 0x49, 0x49, 0x49, 0x41], // E
    [0x7F, 0x09, 0x09, 0x01, 0x01], // F
    [0x3E, 0x41, 0x41, 0x51, 0x32], // G
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // H
    [0x00, 0x41, 0x7F, 0x41, 0x00], // I
    [0x20, 0x40, 0x41, 0x3F, 0x01], // J
    [0x7F, 0x08, 0x14, 0x22, 0x41], // K
    [0x7F, 0x40, 0x40, 0x40, 0x40], // L
    [0x7F, 0x02, 0x04, 0x02, 0x7F], // M
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // N
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // O
    [0x7F, 0x09, 0x09, 0x09, 0x06], // P
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // Q
    [0x7F, 0x09, 0x19, 0x29, 0x46], // R
    [0x46, 0x49, 0x49, 0x49, 0x31], // S
    [0x01, 0x01, 0x7F, 0x01, 0x01], // T
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // U
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // V
    [0x7F, 0x20, 0x18, 0x20, 0x7F], // W
    [0x63, 0x14, 0x08, 0x14, 0x63], // X
    [0x03, 0x04, 0x78, 0x04, 0x03], // Y
    [0x61, 0x51, 0x49, 0x45, 0x43], // Z
    [0x00, 0x7F, 0x41, 0x41, 0x00], // [
    [0x02, 0x04, 0x08, 0x10, 0x20], // barra invertida
    [0x00, 0x41, 0x41, 0x7F, 0x00], // ]
    [0x04, 0x02, 0x01, 0x02, 0x04], // ^
    [0x40, 0x40, 0x40, 0x40, 0x40], // _
    [0x00, 0x01, 0x02, 0x04, 0x00], // `
    [0x20, 0x54, 0x54, 0x54, 0x78], // a
    [0x7F, 0x48, 0x44, 0x44, 0x38], // b
    [0x38, 0x44, 0x44, 0x44, 0x20], // c
    [0x38, 0x44, 0x44, 0x48, 0x7F], // d
    [0x38, 0x54, 0x54, 0x54, 0x18], // e
    [0x08, 0x7E, 0x09, 0x01, 0x02], // f
    [0x08, 0x14, 0x54, 0x54, 0x3C], // g
    [0x7F, 0x08, 0x04, 0x04, 0x78], // h
    [0x00, 0x44, 0x7D, 0x40, 0x00], // i
    [0x20, 0x40, 0x44, 0x3D, 0x00], // j
    [0x00, 0x7F, 0x10, 0x28, 0x44], // k
    [0x00, 0x41, 0x7F, 0x40, 0x00], // l
    [0x7C, 0x04, 0x18, 0x04, 0x78], // m
    [0x7C, 0x08, 0x04, 0x04, 0x78], // n
    [0x38, 0x44, 0x44, 0x44, 0x38], // o
    [0x7C, 0x14, 0x14, 0x14, 0x08], // p
    [0x08, 0x14, 0x14, 0x18, 0x7C], // q
    [0x7C, 0x08, 0x04, 0x04, 0x08], // r
    [0x48, 0x54, 0x54, 0x54, 0x20], // s
    [0x04, 0x3F, 0x44, 0x40, 0x20], // t
    [0x3C, 0x40, 0x40, 0x20, 0x7C], // u
    [0x1C, 0x20, 0x40, 0x20, 0x1C], // v
    [0x3C, 0x40, 0x30, 0x40, 0x3C], // w
    [0x44, 0x28, 0x10, 0x28, 0x44], // x
    [0x0C, 0x50, 0x50, 0x50, 0x3C], // y
    [0x44, 0x64, 0x54, 0x4C, 0x44], // z
    [0x00, 0x08, 0x36, 0x41, 0x00], // {
    [0x00, 0x00, 0x7F, 0x00, 0x00], // |
    [0x00, 0x41, 0x36, 0x08, 0x00], // }
    [0x02, 0x01, 0x02, 0x04, 0x02], // ~
];
