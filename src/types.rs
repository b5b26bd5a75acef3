use glam::Vec2;

use crate::error::WorldError;

/// Stable body identity, allocated by the world in increasing order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BodyId(pub u64);

/// Coulomb friction coefficients.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    /// Bound below which a contact sticks.
    pub static_friction: f32,
    /// Coefficient used once the static bound is exceeded.
    pub dynamic_friction: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            static_friction: 0.5,
            dynamic_friction: 0.3,
        }
    }
}

/// Cosmetic body colour.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const GROUND: Rgb = Rgb(90, 90, 90);

    /// HSL colour with the given hue in degrees.
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 60.0;
        let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = lightness - c / 2.0;
        let to_u8 = |v: f32| ((v + m).clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgb(to_u8(r), to_u8(g), to_u8(b))
    }
}

/// Static bodies never move; dynamic bodies carry a finite positive mass.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum BodyKind {
    Static,
    Dynamic { mass: f32 },
}

/// Description handed to `add_body`.
#[derive(Copy, Clone, Debug)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub position: Vec2,
    /// Full width and height.
    pub size: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub material: Material,
    pub color: Rgb,
}

impl BodyDesc {
    pub fn dynamic(position: Vec2, size: Vec2, mass: f32) -> Self {
        Self {
            kind: BodyKind::Dynamic { mass },
            position,
            size,
            angle: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            material: Material::default(),
            color: Rgb::default(),
        }
    }

    pub fn fixed(position: Vec2, size: Vec2) -> Self {
        Self {
            kind: BodyKind::Static,
            color: Rgb::GROUND,
            ..Self::dynamic(position, size, 1.0)
        }
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: f32) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }
}

/// Render/query snapshot of one body.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BodyView {
    pub id: BodyId,
    pub position: Vec2,
    pub angle: f32,
    pub half_extents: Vec2,
    pub velocity: Vec2,
    pub is_static: bool,
    pub color: Rgb,
}

/// Debug-overlay snapshot of one contact.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ContactView {
    pub a: BodyId,
    pub b: BodyId,
    pub normal: Vec2,
    pub points: Vec<Vec2>,
}

/// Contact solver tuning.
#[derive(Clone, Debug)]
pub struct SolverConfig {
    /// Penetration tolerated before position correction kicks in.
    pub slop: f32,
    /// Fraction of the remaining penetration removed per tick.
    pub position_beta: f32,
    /// Restitution for all impulse passes (0 = fully inelastic).
    pub restitution: f32,
    /// When false the error-correction pass also acts on separating contacts.
    pub correction_rejects_separating: bool,
    /// When true the error-correction friction reads body B's per-tick
    /// delta spin instead of its real spin.
    pub correction_friction_uses_delta_spin: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            slop: 2.0,
            position_beta: 0.3,
            restitution: 0.0,
            correction_rejects_separating: false,
            correction_friction_uses_delta_spin: true,
        }
    }
}

/// Parameters for the random boxes spawned by `new`/`reset`.
#[derive(Clone, Debug)]
pub struct SpawnConfig {
    pub seed: u64,
    pub initial_boxes: usize,
    /// Mass drawn uniformly from `[lo, hi)`.
    pub mass_range: (f32, f32),
    /// Width and height each drawn uniformly from `[lo, hi)`.
    pub size_range: (f32, f32),
    pub material: Material,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            initial_boxes: 8,
            mass_range: (1.0, 5.0),
            size_range: (20.0, 80.0),
            material: Material::default(),
        }
    }
}

/// World-level configuration.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// World extents; only used to place the ground and spawned boxes.
    pub width: f32,
    pub height: f32,
    /// Fixed ticks per second.
    pub tick_rate: u32,
    /// Downward acceleration in units/s per tick; y grows downward.
    pub gravity_strength: f32,
    /// Idle time after which a pair's resting cache entry is dropped.
    pub eviction_seconds: f32,
    /// Thickness of the static ground strip, or `None` for no ground.
    pub ground_thickness: Option<f32>,
    /// Fraction of the remaining distance a grabbed body moves per tick.
    pub grab_follow: f32,
    /// Velocity and spin multiplier applied to a grabbed body per tick.
    pub grab_damping: f32,
    /// Enable per-step timing instrumentation.
    pub enable_timing: bool,
    pub solver: SolverConfig,
    pub spawn: SpawnConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            tick_rate: 60,
            gravity_strength: 10.0,
            eviction_seconds: 0.5,
            ground_thickness: Some(40.0),
            grab_follow: 0.1,
            grab_damping: 0.6,
            enable_timing: false,
            solver: SolverConfig::default(),
            spawn: SpawnConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Gravity as a velocity change per tick.
    pub fn gravity(&self) -> Vec2 {
        Vec2::new(0.0, self.gravity_strength / self.tick_rate.max(1) as f32)
    }

    /// Eviction window in ticks.
    pub fn eviction_ticks(&self) -> u64 {
        (self.tick_rate as f32 * self.eviction_seconds).round().max(0.0) as u64
    }

    pub fn validate(&self) -> Result<(), WorldError> {
        let bad = |reason| Err(WorldError::InvalidConfiguration { reason });
        if self.tick_rate == 0 {
            return bad("tick_rate must be non-zero");
        }
        if !(self.width > 0.0 && self.height > 0.0) || !(self.width.is_finite() && self.height.is_finite()) {
            return bad("world extents must be positive and finite");
        }
        if !self.gravity_strength.is_finite() {
            return bad("gravity_strength must be finite");
        }
        if !(self.eviction_seconds >= 0.0 && self.eviction_seconds.is_finite()) {
            return bad("eviction_seconds must be non-negative");
        }
        if let Some(t) = self.ground_thickness {
            if !(t > 0.0 && t.is_finite()) {
                return bad("ground_thickness must be positive");
            }
        }
        if !(0.0..=1.0).contains(&self.grab_follow) || !(0.0..=1.0).contains(&self.grab_damping) {
            return bad("grab_follow and grab_damping must lie in [0, 1]");
        }
        let s = &self.solver;
        if !(s.slop >= 0.0 && s.slop.is_finite())
            || !(s.position_beta >= 0.0 && s.position_beta.is_finite())
            || !(s.restitution >= 0.0 && s.restitution.is_finite())
        {
            return bad("solver constants must be non-negative and finite");
        }
        let sp = &self.spawn;
        let m = sp.material;
        if !(m.static_friction >= 0.0 && m.static_friction.is_finite())
            || !(m.dynamic_friction >= 0.0 && m.dynamic_friction.is_finite())
        {
            return bad("spawn material friction must be non-negative and finite");
        }
        if !(sp.mass_range.0 > 0.0 && sp.mass_range.0 <= sp.mass_range.1 && sp.mass_range.1.is_finite()) {
            return bad("spawn mass_range must be positive and ordered");
        }
        if !(sp.size_range.0 > 0.0 && sp.size_range.0 <= sp.size_range.1 && sp.size_range.1.is_finite()) {
            return bad("spawn size_range must be positive and ordered");
        }
        Ok(())
    }
}

/// Debug statistics for the current tick.
#[derive(Copy, Clone, Debug, Default)]
pub struct WorldStats {
    pub bodies: usize,
    pub contacts: usize,
    pub contact_points: usize,
    pub cached_pairs: usize,
}

/// Timing breakdown for the last completed step.
#[derive(Copy, Clone, Debug, Default)]
pub struct WorldTiming {
    pub step_ms: f64,
    pub detect_ms: f64,
    pub solve_ms: f64,
}
