//! Parameter definitions with documented semantics.
//!
//! Every tunable constant of the simulation, orb, pulse, and renderer lives
//! here with its units and range, plus `Default` impls for the stock look.

/// Particle field and force field simulation parameters
#[derive(Debug, Clone)]
pub struct GalaxyParams {
    /// Number of background particles (fixed population, created at startup)
    pub particle_count: usize,

    /// Number of drifting force fields (fixed population)
    pub field_count: usize,

    /// Max particle speed per axis at spawn (pixels per frame, centered on 0)
    pub particle_speed: f32,

    /// Particle radius range at spawn (pixels)
    pub particle_size_min: f32,
    pub particle_size_max: f32,

    /// Particle base opacity range at spawn (0-1)
    pub particle_opacity_min: f32,
    pub particle_opacity_max: f32,

    /// Particle hue range at spawn (degrees, purple to magenta)
    pub particle_hue_min: f32,
    pub particle_hue_max: f32,

    /// Per-frame velocity damping multiplier (0-1)
    pub damping: f32,

    /// Per-frame particle life decay (life starts at 1.0, never resets)
    pub life_decay: f32,

    /// Force field radius range at spawn (pixels)
    pub field_radius_min: f32,
    pub field_radius_max: f32,

    /// Force field attraction strength range at spawn
    /// (velocity gained per frame at the field center)
    pub field_strength_min: f32,
    pub field_strength_max: f32,

    /// Max force field drift speed per axis at spawn (pixels per frame)
    pub field_speed: f32,

    /// Wave particles spawned per playback-toggle burst
    pub burst_count: usize,

    /// Wave particle launch speed range (pixels per frame)
    pub burst_speed_min: f32,
    pub burst_speed_max: f32,

    /// Wave particle radius range at spawn (pixels)
    pub wave_size_min: f32,
    pub wave_size_max: f32,

    /// Wave particle hue range at spawn (degrees, cyan to blue)
    pub wave_hue_min: f32,
    pub wave_hue_max: f32,

    /// Per-frame downward acceleration on wave particles (pixels per frame^2)
    pub wave_gravity: f32,

    /// Per-frame wave particle life decay (expires after ~1/decay frames)
    pub wave_life_decay: f32,

    /// Hard cap on live wave particles (oldest dropped first)
    pub wave_capacity: usize,
}

impl Default for GalaxyParams {
    fn default() -> Self {
        Self {
            particle_count: 100,
            field_count: 3,
            particle_speed: 0.4,
            particle_size_min: 0.3,
            particle_size_max: 1.8,
            particle_opacity_min: 0.1,
            particle_opacity_max: 0.4,
            particle_hue_min: 260.0,
            particle_hue_max: 350.0,
            damping: 0.98,
            life_decay: 0.001,
            field_radius_min: 60.0,
            field_radius_max: 100.0,
            field_strength_min: 0.15,
            field_strength_max: 0.25,
            field_speed: 0.075,
            burst_count: 24,
            burst_speed_min: 1.0,
            burst_speed_max: 3.0,
            wave_size_min: 2.0,
            wave_size_max: 6.0,
            wave_hue_min: 180.0,
            wave_hue_max: 300.0,
            wave_gravity: 0.1,
            wave_life_decay: 0.02,
            wave_capacity: 256,
        }
    }
}

/// Central glow orb parameters
#[derive(Debug, Clone)]
pub struct OrbParams {
    /// Orb radius (pixels)
    pub size: f32,

    /// Max drift speed per axis at spawn (pixels per frame, centered on 0)
    pub speed: f32,

    /// Halo ring radius offset beyond the orb body (pixels)
    pub ring_offset: f32,

    /// Halo ring opacity (0-1)
    pub ring_alpha: f32,

    /// Gradient core alpha: base + pulse level * gain
    pub core_alpha_base: f32,
    pub core_alpha_gain: f32,

    /// Gradient midpoint alpha: base + pulse level * gain
    pub mid_alpha_base: f32,
    pub mid_alpha_gain: f32,
}

impl Default for OrbParams {
    fn default() -> Self {
        Self {
            size: 80.0,
            speed: 0.15,
            ring_offset: 20.0,
            ring_alpha: 0.15,
            core_alpha_base: 0.6,
            core_alpha_gain: 0.2,
            mid_alpha_base: 0.3,
            mid_alpha_gain: 0.1,
        }
    }
}

/// Synthetic pulse oscillator parameters.
///
/// The orb brightness follows a slow wall-clock sine rather than measured
/// signal amplitude. Output range is `[offset - amplitude, offset + amplitude]`.
#[derive(Debug, Clone)]
pub struct PulseParams {
    /// Angular rate (radians per second)
    pub rate: f32,

    /// Oscillation amplitude
    pub amplitude: f32,

    /// Oscillation midpoint
    pub offset: f32,
}

impl Default for PulseParams {
    fn default() -> Self {
        Self {
            rate: 0.5,
            amplitude: 0.2,
            offset: 0.2,
        }
    }
}

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Alpha of the black fullscreen fade composited over the previous
    /// frame (0 = infinite trails, 1 = hard clear)
    pub fade_alpha: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fade_alpha: 0.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let galaxy = GalaxyParams::default();
        assert!(galaxy.particle_count > 0);
        assert!(galaxy.field_count > 0);
        assert!(galaxy.damping > 0.0 && galaxy.damping < 1.0);
        assert!(galaxy.life_decay > 0.0);
        assert!(galaxy.particle_size_min <= galaxy.particle_size_max);
        assert!(galaxy.field_radius_min <= galaxy.field_radius_max);

        let orb = OrbParams::default();
        assert!(orb.size > 0.0);
        assert!(orb.ring_offset >= 0.0);

        let render = RenderConfig::default();
        assert!(render.fade_alpha > 0.0 && render.fade_alpha <= 1.0);
    }

    #[test]
    fn test_pulse_bounds_from_defaults() {
        let pulse = PulseParams::default();
        let min = pulse.offset - pulse.amplitude;
        let max = pulse.offset + pulse.amplitude;
        assert!((min - 0.0).abs() < 1e-6);
        assert!((max - 0.4).abs() < 1e-6);
    }
}
