//! Cosmic particle field simulation: drifting particles, wandering force
//! fields, playback-triggered wave bursts, and the central glow orb.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use rand::{rngs::StdRng, Rng};

use crate::params::{GalaxyParams, OrbParams};

/// Per-circle instance data consumed by the renderer.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CircleInstance {
    pub center: [f32; 2],
    pub radius: f32,
    /// 0 = filled disc, otherwise the stroke width of an outline ring
    pub ring_width: f32,
    pub color: [f32; 4],
}

/// Current drawable area in pixels. All wrap/clamp logic reads the live
/// values, not the values at entity creation time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Toroidal wrap into `[0, width) x [0, height)`. `rem_euclid` keeps the
    /// invariant even for large overshoots (e.g. right after a shrink resize).
    pub fn wrap(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.rem_euclid(self.width), p.y.rem_euclid(self.height))
    }
}

/// Background particle. Size, opacity, and hue are fixed at spawn; `life`
/// only ever decreases, so particles fade indefinitely and are never
/// respawned.
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub opacity: f32,
    pub hue: f32,
    pub life: f32,
}

impl Particle {
    fn spawn(rng: &mut StdRng, bounds: Bounds, params: &GalaxyParams) -> Self {
        Self {
            pos: Vec2::new(
                rng.gen_range(0.0..bounds.width),
                rng.gen_range(0.0..bounds.height),
            ),
            vel: Vec2::new(
                rng.gen_range(-params.particle_speed..=params.particle_speed),
                rng.gen_range(-params.particle_speed..=params.particle_speed),
            ),
            size: rng.gen_range(params.particle_size_min..=params.particle_size_max),
            opacity: rng.gen_range(params.particle_opacity_min..=params.particle_opacity_max),
            hue: rng.gen_range(params.particle_hue_min..=params.particle_hue_max),
            life: 1.0,
        }
    }

    /// Advance one frame: drift, wrap, field attraction, damping, life decay.
    pub fn update(&mut self, fields: &[ForceField], bounds: Bounds, params: &GalaxyParams) {
        self.pos = bounds.wrap(self.pos + self.vel);

        for field in fields {
            let delta = field.pos - self.pos;
            let distance = delta.length();

            // Attraction falls off linearly with distance. A particle sitting
            // exactly on the field center has no defined direction; skip it.
            if distance > f32::EPSILON && distance < field.radius {
                let force = (1.0 - distance / field.radius) * field.strength;
                self.vel += (delta / distance) * force;
            }
        }

        self.vel *= params.damping;
        self.life -= params.life_decay;
    }

    /// Draw alpha. Life keeps decreasing past zero; the visual floor is 0.
    pub fn alpha(&self) -> f32 {
        self.opacity * self.life.max(0.0)
    }
}

/// Circular attraction zone that drifts across the canvas and wraps at the
/// edges. Radius and strength are fixed at spawn.
#[derive(Debug, Clone)]
pub struct ForceField {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub strength: f32,
}

impl ForceField {
    fn spawn(rng: &mut StdRng, bounds: Bounds, params: &GalaxyParams) -> Self {
        Self {
            pos: Vec2::new(
                rng.gen_range(0.0..bounds.width),
                rng.gen_range(0.0..bounds.height),
            ),
            vel: Vec2::new(
                rng.gen_range(-params.field_speed..=params.field_speed),
                rng.gen_range(-params.field_speed..=params.field_speed),
            ),
            radius: rng.gen_range(params.field_radius_min..=params.field_radius_max),
            strength: rng.gen_range(params.field_strength_min..=params.field_strength_max),
        }
    }

    pub fn update(&mut self, bounds: Bounds) {
        self.pos = bounds.wrap(self.pos + self.vel);
    }
}

/// Transient burst particle spawned when playback toggles. Gravity-affected,
/// expires after roughly `1 / wave_life_decay` frames and is then removed.
#[derive(Debug, Clone)]
pub struct WaveParticle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub size: f32,
    pub hue: f32,
}

impl WaveParticle {
    pub fn update(&mut self, params: &GalaxyParams) {
        self.pos += self.vel;
        self.vel.y += params.wave_gravity;
        self.life -= params.wave_life_decay;
    }

    pub fn expired(&self) -> bool {
        self.life <= 0.0
    }
}

/// The single large glowing orb. Bounces elastically off the edges and is
/// clamped so it never draws off-canvas, even right after a bounce.
#[derive(Debug, Clone)]
pub struct Orb {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
}

impl Orb {
    fn spawn(rng: &mut StdRng, bounds: Bounds, params: &OrbParams) -> Self {
        Self {
            pos: Vec2::new(bounds.width / 2.0, bounds.height / 2.0),
            vel: Vec2::new(
                rng.gen_range(-params.speed..=params.speed),
                rng.gen_range(-params.speed..=params.speed),
            ),
            size: params.size,
        }
    }

    pub fn update(&mut self, bounds: Bounds) {
        self.pos += self.vel;

        if self.pos.x - self.size < 0.0 || self.pos.x + self.size > bounds.width {
            self.vel.x = -self.vel.x;
        }
        if self.pos.y - self.size < 0.0 || self.pos.y + self.size > bounds.height {
            self.vel.y = -self.vel.y;
        }

        // min before max: if the window is ever narrower than the orb, the
        // lower clamp wins instead of panicking on an inverted range.
        self.pos.x = self.pos.x.min(bounds.width - self.size).max(self.size);
        self.pos.y = self.pos.y.min(bounds.height - self.size).max(self.size);
    }
}

/// Full simulation context: entity collections, the orb, and the live
/// bounds, stepped once per rendered frame.
pub struct GalaxySystem {
    params: GalaxyParams,
    orb_params: OrbParams,
    particles: Vec<Particle>,
    fields: Vec<ForceField>,
    waves: Vec<WaveParticle>,
    orb: Orb,
    bounds: Bounds,
    rng: StdRng,
}

impl GalaxySystem {
    /// Create a populated system. All initial placement comes from `rng`, so
    /// a seeded generator reproduces the exact same sky.
    pub fn new(params: GalaxyParams, orb_params: OrbParams, bounds: Bounds, mut rng: StdRng) -> Self {
        let particles = (0..params.particle_count)
            .map(|_| Particle::spawn(&mut rng, bounds, &params))
            .collect();
        let fields = (0..params.field_count)
            .map(|_| ForceField::spawn(&mut rng, bounds, &params))
            .collect();
        let orb = Orb::spawn(&mut rng, bounds, &orb_params);

        Self {
            params,
            orb_params,
            particles,
            fields,
            waves: Vec::new(),
            orb,
            bounds,
            rng,
        }
    }

    pub fn orb(&self) -> &Orb {
        &self.orb
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Advance the whole simulation by one frame.
    pub fn step(&mut self) {
        self.orb.update(self.bounds);

        for particle in &mut self.particles {
            particle.update(&self.fields, self.bounds, &self.params);
        }

        for field in &mut self.fields {
            field.update(self.bounds);
        }

        for wave in &mut self.waves {
            wave.update(&self.params);
        }
        self.waves.retain(|w| !w.expired());
    }

    /// Spawn a radial wave-particle burst at `origin` (playback toggled).
    pub fn burst(&mut self, origin: Vec2) {
        use std::f32::consts::TAU;

        for i in 0..self.params.burst_count {
            let angle = TAU * i as f32 / self.params.burst_count as f32
                + self.rng.gen_range(-0.2..0.2);
            let speed = self
                .rng
                .gen_range(self.params.burst_speed_min..=self.params.burst_speed_max);

            self.waves.push(WaveParticle {
                pos: origin,
                vel: Vec2::from_angle(angle) * speed,
                life: 1.0,
                size: self
                    .rng
                    .gen_range(self.params.wave_size_min..=self.params.wave_size_max),
                hue: self
                    .rng
                    .gen_range(self.params.wave_hue_min..=self.params.wave_hue_max),
            });
        }

        // Oldest bursts go first when spamming the toggle.
        if self.waves.len() > self.params.wave_capacity {
            let excess = self.waves.len() - self.params.wave_capacity;
            self.waves.drain(0..excess);
        }
    }

    /// Swap in new bounds after a window resize. Entities keep their state;
    /// the next update wraps or clamps against the new dimensions.
    pub fn resize(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    /// Emit draw instances back-to-front. Returns the index of the first
    /// instance that must render *above* the orb body (the halo ring);
    /// everything before it renders below.
    pub fn write_instances(&self, out: &mut Vec<CircleInstance>) -> usize {
        out.clear();

        for p in &self.particles {
            let [r, g, b] = hsl_to_rgb(p.hue, 1.0, 0.5);
            out.push(CircleInstance {
                center: p.pos.to_array(),
                radius: p.size,
                ring_width: 0.0,
                color: [r, g, b, p.alpha()],
            });
        }

        for w in &self.waves {
            let [r, g, b] = hsl_to_rgb(w.hue, 1.0, 0.5);
            out.push(CircleInstance {
                center: w.pos.to_array(),
                radius: w.size,
                ring_width: 0.0,
                color: [r, g, b, 0.7 * w.life.max(0.0)],
            });
        }

        for f in &self.fields {
            out.push(CircleInstance {
                center: f.pos.to_array(),
                radius: f.radius,
                ring_width: 2.0,
                color: [0.0, 1.0, 1.0, 0.1],
            });
        }

        let overlay_start = out.len();

        out.push(CircleInstance {
            center: self.orb.pos.to_array(),
            radius: self.orb.size + self.orb_params.ring_offset,
            ring_width: 2.0,
            color: [0.54, 0.17, 0.89, self.orb_params.ring_alpha],
        });

        overlay_start
    }
}

/// Convert HSL (hue in degrees, saturation/lightness in 0-1) to RGB in 0-1.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    let h = h.rem_euclid(360.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    [r + m, g + m, b + m]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn test_system(width: f32, height: f32) -> GalaxySystem {
        GalaxySystem::new(
            GalaxyParams::default(),
            OrbParams::default(),
            Bounds::new(width, height),
            StdRng::seed_from_u64(42),
        )
    }

    fn in_bounds(p: Vec2, b: Bounds) -> bool {
        p.x >= 0.0 && p.x < b.width && p.y >= 0.0 && p.y < b.height
    }

    #[test]
    fn test_particles_stay_in_bounds() {
        let mut galaxy = test_system(800.0, 600.0);
        for _ in 0..1000 {
            galaxy.step();
        }
        for p in &galaxy.particles {
            assert!(
                in_bounds(p.pos, galaxy.bounds),
                "particle escaped at {:?}",
                p.pos
            );
        }
    }

    #[test]
    fn test_fields_stay_in_bounds() {
        let mut galaxy = test_system(800.0, 600.0);
        for _ in 0..1000 {
            galaxy.step();
        }
        for f in &galaxy.fields {
            assert!(in_bounds(f.pos, galaxy.bounds), "field escaped at {:?}", f.pos);
        }
    }

    #[test]
    fn test_orb_stays_clamped() {
        let mut galaxy = test_system(800.0, 600.0);
        for _ in 0..5000 {
            galaxy.step();
            let orb = galaxy.orb();
            assert!(orb.pos.x >= orb.size && orb.pos.x <= galaxy.bounds.width - orb.size);
            assert!(orb.pos.y >= orb.size && orb.pos.y <= galaxy.bounds.height - orb.size);
        }
    }

    #[test]
    fn test_field_attraction_pulls_inward() {
        let params = GalaxyParams::default();
        let bounds = Bounds::new(800.0, 600.0);
        let mut particle = Particle {
            pos: Vec2::new(100.0, 100.0),
            vel: Vec2::ZERO,
            size: 1.0,
            opacity: 0.2,
            hue: 280.0,
            life: 1.0,
        };
        let fields = [ForceField {
            pos: Vec2::new(130.0, 100.0),
            vel: Vec2::ZERO,
            radius: 60.0,
            strength: 0.2,
        }];

        particle.update(&fields, bounds, &params);

        // Field sits at +x; velocity must have gained a +x component.
        assert!(particle.vel.x > 0.0);
        assert!(particle.vel.y.abs() < 1e-6);
    }

    #[test]
    fn test_particle_at_field_center_stays_finite() {
        let params = GalaxyParams::default();
        let bounds = Bounds::new(800.0, 600.0);
        let mut particle = Particle {
            pos: Vec2::new(100.0, 100.0),
            vel: Vec2::ZERO,
            size: 1.0,
            opacity: 0.2,
            hue: 280.0,
            life: 1.0,
        };
        let fields = [ForceField {
            pos: Vec2::new(100.0, 100.0),
            vel: Vec2::ZERO,
            radius: 60.0,
            strength: 0.2,
        }];

        particle.update(&fields, bounds, &params);

        assert!(particle.pos.x.is_finite() && particle.pos.y.is_finite());
        assert!(particle.vel.x.is_finite() && particle.vel.y.is_finite());
    }

    #[test]
    fn test_particle_life_monotonically_decreases() {
        let mut galaxy = test_system(800.0, 600.0);
        let mut previous: Vec<f32> = galaxy.particles.iter().map(|p| p.life).collect();

        for _ in 0..200 {
            galaxy.step();
            for (p, prev) in galaxy.particles.iter().zip(&previous) {
                assert!(p.life < *prev);
            }
            previous = galaxy.particles.iter().map(|p| p.life).collect();
        }
    }

    #[test]
    fn test_burst_spawns_and_expires() {
        let mut galaxy = test_system(800.0, 600.0);
        let origin = galaxy.orb().pos;

        galaxy.burst(origin);
        assert_eq!(galaxy.waves.len(), galaxy.params.burst_count);

        // Default decay 0.02 expires a wave after 50 updates.
        for _ in 0..60 {
            galaxy.step();
        }
        assert!(galaxy.waves.is_empty());
    }

    #[test]
    fn test_wave_capacity_is_enforced() {
        let mut galaxy = test_system(800.0, 600.0);
        let origin = galaxy.orb().pos;
        for _ in 0..100 {
            galaxy.burst(origin);
        }
        assert!(galaxy.waves.len() <= galaxy.params.wave_capacity);
    }

    #[test]
    fn test_resize_rebounds_entities() {
        let mut galaxy = test_system(1280.0, 720.0);
        for _ in 0..50 {
            galaxy.step();
        }

        let shrunk = Bounds::new(400.0, 300.0);
        galaxy.resize(shrunk);
        galaxy.step();

        for p in &galaxy.particles {
            assert!(in_bounds(p.pos, shrunk));
        }
        for f in &galaxy.fields {
            assert!(in_bounds(f.pos, shrunk));
        }
    }

    #[test]
    fn test_instances_put_halo_ring_above_orb() {
        let mut galaxy = test_system(800.0, 600.0);
        galaxy.burst(galaxy.orb.pos);

        let mut instances = Vec::new();
        let overlay_start = galaxy.write_instances(&mut instances);

        let expected_below = galaxy.params.particle_count
            + galaxy.waves.len()
            + galaxy.params.field_count;
        assert_eq!(overlay_start, expected_below);
        assert_eq!(instances.len(), overlay_start + 1);

        let ring = &instances[overlay_start];
        assert_eq!(
            ring.radius,
            galaxy.orb.size + galaxy.orb_params.ring_offset
        );
        assert!(ring.ring_width > 0.0);
    }

    #[test]
    fn test_hsl_to_rgb_primaries() {
        let red = hsl_to_rgb(0.0, 1.0, 0.5);
        assert!((red[0] - 1.0).abs() < 1e-5 && red[1].abs() < 1e-5 && red[2].abs() < 1e-5);

        let green = hsl_to_rgb(120.0, 1.0, 0.5);
        assert!(green[0].abs() < 1e-5 && (green[1] - 1.0).abs() < 1e-5);

        let blue = hsl_to_rgb(240.0, 1.0, 0.5);
        assert!((blue[2] - 1.0).abs() < 1e-5 && blue[0].abs() < 1e-5);

        // Lightness 0.5, full saturation never exceeds channel range.
        for hue in 0..36 {
            let rgb = hsl_to_rgb(hue as f32 * 10.0, 1.0, 0.5);
            for channel in rgb {
                assert!((0.0..=1.0).contains(&channel));
            }
        }
    }
}
