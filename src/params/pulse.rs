//! Beat pulse animation parameters and the strength palette.

/// Anchor colors for strength-to-color mapping, weakest first
pub const DEFAULT_PALETTE: [[u8; 3]; 6] = [
    [255, 160, 130], // coral
    [255, 190, 100], // warm yellow
    [120, 180, 250], // blue
    [160, 215, 120], // green
    [160, 140, 210], // violet
    [240, 120, 160], // pink
];

/// Pulse animation parameters
#[derive(Debug, Clone)]
pub struct PulseParams {
    /// Radius of a zero-strength pulse at spawn (pixels)
    pub base_radius_px: f32,

    /// Extra scale per unit of normalized strength
    /// Formula: scale = 1 + strength * this_gain
    pub strength_scale_gain: f32,

    /// Radial growth per second of pulse age (fraction of spawn radius)
    pub growth_per_s: f32,

    /// Time for opacity to fall from full to the floor (seconds)
    pub fade_window_s: f64,

    /// Lifetime past the next beat before a pulse is retired (seconds)
    pub fade_tail_s: f64,

    /// Lowest opacity a live pulse is drawn with (0-255)
    pub alpha_floor: u8,
}

impl Default for PulseParams {
    fn default() -> Self {
        Self {
            base_radius_px: 50.0,
            strength_scale_gain: 1.5,
            growth_per_s: 0.2,
            fade_window_s: 0.5,
            fade_tail_s: 0.6,
            alpha_floor: 1,
        }
    }
}
