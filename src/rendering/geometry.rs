//! CPU-side scene building: strength trace and pulse discs as triangles.
//!
//! Positions are in canvas pixels with the origin at the top-left; the
//! vertex shader maps them to clip space.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::params::RenderConfig;
use crate::sync::{FrameOutput, RenderablePulse, Rgb};

/// Vertex for the single scene pipeline
///
/// `local` is the position inside a pulse disc in `[-1, 1]`; trace
/// vertices use the origin so they are never masked.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable, PartialEq)]
pub struct Vertex {
    pub position: [f32; 2],
    pub local: [f32; 2],
    pub color: [f32; 4],
}

/// Build the full frame: trace first, pulses on top
pub fn build_scene(frame: &FrameOutput, config: &RenderConfig) -> Vec<Vertex> {
    let points = trace_points(&frame.history, frame.global_max, config);
    let mut vertices =
        Vec::with_capacity(points.len().saturating_sub(1) * 6 + frame.pulses.len() * 6);

    let trace_color = linear_rgba(frame.color, 255);
    for segment in points.windows(2) {
        push_segment(
            &mut vertices,
            segment[0],
            segment[1],
            config.trace_width_px,
            trace_color,
        );
    }

    for pulse in &frame.pulses {
        push_pulse(&mut vertices, pulse);
    }
    vertices
}

/// Trace polyline spread across the canvas, oldest sample on the left
pub fn trace_points(history: &[f32], global_max: f32, config: &RenderConfig) -> Vec<Vec2> {
    if history.len() < 2 {
        return Vec::new();
    }
    let width = config.window_width as f32;
    let height = config.window_height as f32;
    let span = width - 2.0 * config.trace_margin_px;
    let step = span / (history.len() - 1) as f32;
    let baseline = height - config.trace_baseline_px;

    history
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let level = if global_max > 0.0 && value.is_finite() {
                value / global_max
            } else {
                0.0
            };
            Vec2::new(
                config.trace_margin_px + i as f32 * step,
                baseline - level * config.trace_height_px,
            )
        })
        .collect()
}

/// Thick line segment as two triangles
fn push_segment(vertices: &mut Vec<Vertex>, a: Vec2, b: Vec2, width: f32, color: [f32; 4]) {
    let normal = (b - a).normalize_or_zero().perp() * (width / 2.0);
    let corners = [a + normal, a - normal, b + normal, b - normal];
    for index in [0, 1, 2, 2, 1, 3] {
        vertices.push(Vertex {
            position: corners[index].to_array(),
            local: [0.0, 0.0],
            color,
        });
    }
}

/// Pulse disc as a quad; the fragment shader masks it to a circle
fn push_pulse(vertices: &mut Vec<Vertex>, pulse: &RenderablePulse) {
    let center = Vec2::from_array(pulse.center);
    let color = linear_rgba(pulse.color, pulse.alpha);
    let corners = [
        Vec2::new(-1.0, -1.0),
        Vec2::new(1.0, -1.0),
        Vec2::new(-1.0, 1.0),
        Vec2::new(1.0, 1.0),
    ];
    for index in [0, 1, 2, 2, 1, 3] {
        let local = corners[index];
        vertices.push(Vertex {
            position: (center + local * pulse.radius).to_array(),
            local: local.to_array(),
            color,
        });
    }
}

/// sRGB color to linear RGBA for an sRGB render target
pub fn linear_rgba(color: Rgb, alpha: u8) -> [f32; 4] {
    let [r, g, b, a] = color.to_rgba_f32(alpha);
    [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), a]
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
