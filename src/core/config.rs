use serde::{Deserialize, Serialize};
use std::env;

/// Clasificación del viewport que disparó la exportación. Decide margen,
/// escala de captura y política de paginación del pipeline raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Viewport {
    Wide,
    Narrow,
}

impl Viewport {
    /// Umbral en píxeles: por debajo es Narrow, desde el umbral es Wide.
    pub const BREAKPOINT: u32 = 768;

    pub fn classify(width_px: u32) -> Self {
        if width_px < Self::BREAKPOINT {
            Viewport::Narrow
        } else {
            Viewport::Wide
        }
    }

    /// Margen de página en unidades de longitud (mm sobre A4).
    pub fn margin(&self) -> f32 {
        match self {
            Viewport::Wide => 10.0,
            Viewport::Narrow => 15.0,
        }
    }

    /// Factor de resolución de la captura (fidelidad vs. tamaño del artefacto).
    pub fn capture_scale(&self) -> u32 {
        match self {
            Viewport::Wide => 2,
            Viewport::Narrow => 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PageSpec {
    pub width: f32,
    pub height: f32,
}

impl PageSpec {
    pub fn a4() -> Self {
        PageSpec {
            width: 210.0,
            height: 297.0,
        }
    }

    pub fn content_width(&self, margin: f32) -> f32 {
        self.width - 2.0 * margin
    }

    pub fn usable_height(&self, margin: f32) -> f32 {
        self.height - 2.0 * margin
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::a4()
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub currency_prefix: String,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        ServiceConfig {
            currency_prefix: env::var("EXPORT_CURRENCY_PREFIX")
                .unwrap_or_else(|_| "Rs.".to_string()),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            currency_prefix: "Rs.".to_string(),
        }
    }
}
