//! CPU filter backend.
//!
//! Per-pixel implementations of the filter stages, matching the rendering
//! engine's formulas. Channel writes saturate at 0 and 255; alpha is never
//! touched.

use tc_core::filter::{FilterBackend, FilterKind, FilterParams, Raster};

#[derive(Debug, Clone, Copy, Default)]
pub struct CpuFilters;

impl FilterBackend for CpuFilters {
    fn rasterize(&self, source: &Raster, pipeline: &[FilterKind], params: &FilterParams) -> Raster {
        let mut out = source.clone();
        for stage in pipeline {
            apply_stage(&mut out, *stage, params);
        }
        log::trace!(
            "rasterized {}x{} through {} stage(s)",
            out.width(),
            out.height(),
            pipeline.len()
        );
        out
    }
}

fn clamp_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn luminance(r: f32, g: f32, b: f32) -> f32 {
    0.34 * r + 0.5 * g + 0.16 * b
}

/// Apply one stage in place.
pub fn apply_stage(raster: &mut Raster, stage: FilterKind, params: &FilterParams) {
    let px = raster.pixels_mut();
    match stage {
        FilterKind::Brightness => {
            let delta = params.brightness * 255.0;
            for p in px.chunks_exact_mut(4) {
                for c in &mut p[..3] {
                    *c = clamp_channel(*c as f32 + delta);
                }
            }
        }
        FilterKind::Contrast => {
            let adjust = ((params.contrast + 100.0) / 100.0).powi(2);
            for p in px.chunks_exact_mut(4) {
                for c in &mut p[..3] {
                    let v = ((*c as f32 / 255.0 - 0.5) * adjust + 0.5) * 255.0;
                    *c = clamp_channel(v);
                }
            }
        }
        FilterKind::Grayscale => {
            for p in px.chunks_exact_mut(4) {
                let l = clamp_channel(luminance(p[0] as f32, p[1] as f32, p[2] as f32));
                p[0] = l;
                p[1] = l;
                p[2] = l;
            }
        }
        FilterKind::Sepia => {
            for p in px.chunks_exact_mut(4) {
                let (r, g, b) = (p[0] as f32, p[1] as f32, p[2] as f32);
                p[0] = clamp_channel(r * 0.393 + g * 0.769 + b * 0.189);
                p[1] = clamp_channel(r * 0.349 + g * 0.686 + b * 0.168);
                p[2] = clamp_channel(r * 0.272 + g * 0.534 + b * 0.131);
            }
        }
        FilterKind::Rgb => {
            for p in px.chunks_exact_mut(4) {
                let l = luminance(p[0] as f32, p[1] as f32, p[2] as f32) / 255.0;
                p[0] = clamp_channel(l * params.red);
                p[1] = clamp_channel(l * params.green);
                p[2] = clamp_channel(l * params.blue);
            }
        }
    }
}
