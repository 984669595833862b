//! Strength-to-color mapping over an ordered anchor list.

use crate::error::{Error, Result};
use crate::params::DEFAULT_PALETTE;

/// 8-bit RGB color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear-space-agnostic float color with the given 0-255 opacity
    pub fn to_rgba_f32(self, alpha: u8) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            alpha as f32 / 255.0,
        ]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

/// Piecewise-linear palette over `[0, 1]`
///
/// N anchors split the unit interval into N-1 equal segments. Callers clamp
/// strengths into `[0, 1]` before lookup.
#[derive(Debug, Clone)]
pub struct Palette {
    anchors: Vec<Rgb>,
}

impl Palette {
    pub fn new(anchors: Vec<Rgb>) -> Result<Self> {
        if anchors.len() < 2 {
            return Err(Error::InvalidPalette(anchors.len()));
        }
        Ok(Self { anchors })
    }

    pub fn anchors(&self) -> &[Rgb] {
        &self.anchors
    }

    /// Color for a normalized strength in `[0, 1]`
    ///
    /// Channels are truncated toward zero after interpolation.
    pub fn color_for(&self, strength: f32) -> Rgb {
        let segments = self.anchors.len() - 1;
        let scaled = strength * segments as f32;
        let index = (scaled.floor().max(0.0) as usize).min(segments - 1);
        let frac = scaled - index as f32;

        let c1 = self.anchors[index];
        let c2 = self.anchors[index + 1];
        Rgb {
            r: lerp_channel(c1.r, c2.r, frac),
            g: lerp_channel(c1.g, c2.g, frac),
            b: lerp_channel(c1.b, c2.b, frac),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            anchors: DEFAULT_PALETTE.iter().copied().map(Rgb::from).collect(),
        }
    }
}

fn lerp_channel(a: u8, b: u8, frac: f32) -> u8 {
    let value = a as f32 + (b as f32 - a as f32) * frac;
    value.trunc().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_match_anchors() {
        let palette = Palette::default();
        let anchors = palette.anchors();
        assert_eq!(palette.color_for(0.0), anchors[0]);
        assert_eq!(palette.color_for(1.0), anchors[anchors.len() - 1]);
    }

    #[test]
    fn test_interior_anchor_hit_exactly() {
        let palette = Palette::default();
        // 6 anchors → 5 segments; 0.4 lands on anchor 2
        assert_eq!(palette.color_for(0.4), Rgb::new(120, 180, 250));
    }

    #[test]
    fn test_midpoint_truncates() {
        let palette = Palette::new(vec![Rgb::new(0, 255, 10), Rgb::new(255, 0, 11)]).unwrap();
        // 127.5 → 127, 127.5 → 127, 10.5 → 10
        assert_eq!(palette.color_for(0.5), Rgb::new(127, 127, 10));
    }

    #[test]
    fn test_rejects_single_anchor() {
        assert!(Palette::new(vec![Rgb::new(1, 2, 3)]).is_err());
        assert!(Palette::new(Vec::new()).is_err());
    }

    #[test]
    fn test_channels_follow_segment_direction() {
        let palette = Palette::default();
        let anchors = palette.anchors().to_vec();
        let segments = anchors.len() - 1;

        for seg in 0..segments {
            let (a, b) = (anchors[seg], anchors[seg + 1]);
            let mut prev = a;
            for step in 1..=50 {
                let s = (seg as f32 + step as f32 / 50.0) / segments as f32;
                let c = palette.color_for(s.min(1.0));
                for (p, n, lo, hi) in [
                    (prev.r, c.r, a.r, b.r),
                    (prev.g, c.g, a.g, b.g),
                    (prev.b, c.b, a.b, b.b),
                ] {
                    if hi >= lo {
                        assert!(n >= p, "segment {seg}: channel decreased {p} -> {n}");
                    } else {
                        assert!(n <= p, "segment {seg}: channel increased {p} -> {n}");
                    }
                }
                prev = c;
            }
        }
    }

    #[test]
    fn test_continuous_across_segment_boundaries() {
        let palette = Palette::default();
        let segments = palette.anchors().len() - 1;
        for seg in 1..segments {
            let boundary = seg as f32 / segments as f32;
            let left = palette.color_for(boundary - 1e-4);
            let right = palette.color_for(boundary + 1e-4);
            for (l, r) in [(left.r, right.r), (left.g, right.g), (left.b, right.b)] {
                assert!(
                    (l as i16 - r as i16).abs() <= 1,
                    "jump at boundary {boundary}: {l} vs {r}"
                );
            }
        }
    }
}
