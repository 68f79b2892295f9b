//! Image filter presets, parameters and the derived filter cache.
//!
//! The rasterized output of a filter pipeline is derived state: it is never
//! serialized, and it is keyed by a hash of the pipeline and its parameters
//! so that a read after any parameter write recomputes it.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

/// Named, fixed combinations of filter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterPreset {
    #[default]
    None,
    Sunny,
    BlueTone,
    Monochrome,
    Vintage,
    HighContrast,
}

/// A single stage of the filter pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    Brightness,
    Contrast,
    #[serde(rename = "RGB")]
    Rgb,
    Grayscale,
    Sepia,
}

pub type FilterPipeline = SmallVec<[FilterKind; 2]>;

/// Per-channel filter parameters. All zero means "no adjustment".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    #[serde(skip_serializing_if = "is_zero")]
    pub brightness: f32,
    #[serde(skip_serializing_if = "is_zero")]
    pub contrast: f32,
    #[serde(skip_serializing_if = "is_zero")]
    pub saturation: f32,
    #[serde(skip_serializing_if = "is_zero")]
    pub sepia: f32,
    #[serde(skip_serializing_if = "is_zero")]
    pub hue: f32,
    #[serde(skip_serializing_if = "is_zero")]
    pub grayscale: f32,
    #[serde(skip_serializing_if = "is_zero")]
    pub red: f32,
    #[serde(skip_serializing_if = "is_zero")]
    pub green: f32,
    #[serde(skip_serializing_if = "is_zero")]
    pub blue: f32,
}

fn is_zero(v: &f32) -> bool {
    *v == 0.0
}

impl FilterParams {
    fn fields(&self) -> [f32; 9] {
        [
            self.brightness,
            self.contrast,
            self.saturation,
            self.sepia,
            self.hue,
            self.grayscale,
            self.red,
            self.green,
            self.blue,
        ]
    }

    pub fn is_finite(&self) -> bool {
        self.fields().iter().all(|v| v.is_finite())
    }

    /// Hash of the pipeline and every parameter; the filter cache is valid
    /// only while this key is unchanged.
    pub fn cache_key(&self, pipeline: &[FilterKind]) -> u64 {
        let mut hasher = DefaultHasher::new();
        pipeline.hash(&mut hasher);
        for v in self.fields() {
            v.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }
}

impl FilterPreset {
    pub const ALL: [FilterPreset; 6] = [
        FilterPreset::None,
        FilterPreset::Sunny,
        FilterPreset::BlueTone,
        FilterPreset::Monochrome,
        FilterPreset::Vintage,
        FilterPreset::HighContrast,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterPreset::None => "none",
            FilterPreset::Sunny => "sunny",
            FilterPreset::BlueTone => "blue-tone",
            FilterPreset::Monochrome => "monochrome",
            FilterPreset::Vintage => "vintage",
            FilterPreset::HighContrast => "high-contrast",
        }
    }

    pub fn pipeline(self) -> FilterPipeline {
        let stages: &[FilterKind] = match self {
            FilterPreset::None => &[],
            FilterPreset::Sunny => &[FilterKind::Brightness, FilterKind::Contrast],
            FilterPreset::BlueTone => &[FilterKind::Rgb],
            FilterPreset::Monochrome => &[FilterKind::Grayscale],
            FilterPreset::Vintage => &[FilterKind::Sepia],
            FilterPreset::HighContrast => &[FilterKind::Contrast],
        };
        SmallVec::from_slice(stages)
    }

    pub fn params(self) -> FilterParams {
        let base = FilterParams::default();
        match self {
            FilterPreset::None => base,
            FilterPreset::Sunny => FilterParams {
                brightness: 0.15,
                contrast: 0.25,
                ..base
            },
            FilterPreset::BlueTone => FilterParams {
                red: -20.0,
                green: -20.0,
                blue: 50.0,
                ..base
            },
            FilterPreset::Monochrome => FilterParams {
                grayscale: 1.0,
                ..base
            },
            FilterPreset::Vintage => FilterParams { sepia: 1.0, ..base },
            FilterPreset::HighContrast => FilterParams {
                contrast: 0.7,
                ..base
            },
        }
    }
}

impl fmt::Display for FilterPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterPreset {
    type Err = CoreError;

    /// Unknown names fall back to `none`, matching how the preset dropdown
    /// treats stray values.
    fn from_str(s: &str) -> CoreResult<Self> {
        Ok(Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .unwrap_or_else(|| {
                log::debug!("unknown filter preset {s:?}, using none");
                FilterPreset::None
            }))
    }
}

// ─── Raster ──────────────────────────────────────────────────────────────

/// An RGBA8 bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> CoreResult<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(CoreError::InvalidRaster(format!(
                "{width}x{height} needs {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }
}

/// The rendering engine's filter subsystem.
///
/// Its availability is probed once at start-up; when absent, images are
/// shown unfiltered and the cache is never populated.
pub trait FilterBackend {
    fn rasterize(&self, source: &Raster, pipeline: &[FilterKind], params: &FilterParams) -> Raster;
}

// ─── Filter cache ────────────────────────────────────────────────────────

/// Cached filter output for one image node.
#[derive(Debug, Clone, Default)]
pub struct FilterCache {
    key: Option<u64>,
    bitmap: Option<Arc<Raster>>,
}

impl FilterCache {
    pub fn is_fresh(&self, key: u64) -> bool {
        self.key == Some(key) && self.bitmap.is_some()
    }

    pub fn key(&self) -> Option<u64> {
        self.key
    }

    pub fn bitmap(&self) -> Option<&Arc<Raster>> {
        self.bitmap.as_ref()
    }

    pub fn store(&mut self, key: u64, bitmap: Raster) -> Arc<Raster> {
        let bitmap = Arc::new(bitmap);
        self.key = Some(key);
        self.bitmap = Some(Arc::clone(&bitmap));
        bitmap
    }

    pub fn invalidate(&mut self) {
        self.key = None;
        self.bitmap = None;
    }
}

/// Derived state never participates in attribute equality.
impl PartialEq for FilterCache {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}
