use glam::Vec2;

use crate::api::NarrowphaseApi;
use crate::error::WorldError;
use crate::math::{Vec2Ext, spin_cross};
use crate::narrowphase::Narrowphase;
use crate::types::*;

/// Collision shape. Only rectangles exist; new kinds go here as variants.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Shape {
    /// Rectangle centred on the body position, axis-aligned before rotation.
    Rect { half_extents: Vec2 },
}

impl Shape {
    /// Corners in body space, in winding order.
    pub fn local_vertices(&self) -> [Vec2; 4] {
        match *self {
            Shape::Rect { half_extents: h } => [
                Vec2::new(-h.x, -h.y),
                Vec2::new(h.x, -h.y),
                Vec2::new(h.x, h.y),
                Vec2::new(-h.x, h.y),
            ],
        }
    }

    /// Moment of inertia about the centre for the given mass.
    pub fn inertia(&self, mass: f32) -> f32 {
        match *self {
            Shape::Rect { half_extents } => {
                let size = half_extents * 2.0;
                mass * (size.x * size.x + size.y * size.y) / 12.0
            }
        }
    }

    pub fn half_extents(&self) -> Vec2 {
        match *self {
            Shape::Rect { half_extents } => half_extents,
        }
    }
}

/// A rigid rectangle.
///
/// Identity and mass properties are fixed at construction; hosts may move a
/// body or change its velocity between steps, nothing else.
#[derive(Clone, Debug)]
pub struct RigidBody {
    pub(crate) id: BodyId,
    pub(crate) shape: Shape,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Velocity gained this tick from external forces (reset every step).
    pub(crate) delta_velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
    /// Spin gained this tick from external forces (reset every step).
    pub(crate) delta_angular_velocity: f32,
    /// `f32::INFINITY` for static bodies.
    pub(crate) mass: f32,
    pub(crate) inv_mass: f32,
    pub(crate) inertia: f32,
    pub(crate) inv_inertia: f32,
    pub(crate) material: Material,
    pub color: Rgb,
}

impl RigidBody {
    /// Build a body from a description, rejecting anything non-physical.
    pub fn from_desc(id: BodyId, desc: &BodyDesc) -> Result<Self, WorldError> {
        let bad = |reason| Err(WorldError::InvalidBody { reason });
        if !(desc.size.x > 0.0 && desc.size.y > 0.0) || !desc.size.is_finite() {
            return bad("size must be positive and finite");
        }
        if !desc.position.is_finite() || !desc.angle.is_finite() {
            return bad("pose must be finite");
        }
        if !desc.velocity.is_finite() || !desc.angular_velocity.is_finite() {
            return bad("velocity must be finite");
        }
        let m = desc.material;
        if !(m.static_friction >= 0.0 && m.dynamic_friction >= 0.0)
            || !(m.static_friction.is_finite() && m.dynamic_friction.is_finite())
        {
            return bad("friction must be non-negative and finite");
        }

        let shape = Shape::Rect { half_extents: desc.size * 0.5 };
        let (mass, inv_mass, inertia, inv_inertia) = match desc.kind {
            BodyKind::Static => (f32::INFINITY, 0.0, f32::INFINITY, 0.0),
            BodyKind::Dynamic { mass } => {
                if !(mass > 0.0 && mass.is_finite()) {
                    return bad("dynamic mass must be positive and finite");
                }
                let inertia = shape.inertia(mass);
                (mass, 1.0 / mass, inertia, 1.0 / inertia)
            }
        };
        // Static bodies ignore any initial motion.
        let (velocity, angular_velocity) = match desc.kind {
            BodyKind::Static => (Vec2::ZERO, 0.0),
            BodyKind::Dynamic { .. } => (desc.velocity, desc.angular_velocity),
        };

        Ok(Self {
            id,
            shape,
            position: desc.position,
            velocity,
            delta_velocity: Vec2::ZERO,
            angle: desc.angle,
            angular_velocity,
            delta_angular_velocity: 0.0,
            mass,
            inv_mass,
            inertia,
            inv_inertia,
            material: desc.material,
            color: desc.color,
        })
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Zero for static bodies.
    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    pub fn inv_inertia(&self) -> f32 {
        self.inv_inertia
    }

    pub fn material(&self) -> Material {
        self.material
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.inv_mass == 0.0
    }

    pub fn half_extents(&self) -> Vec2 {
        self.shape.half_extents()
    }

    /// World-space corners, same winding as `Shape::local_vertices`.
    pub fn vertices(&self) -> [Vec2; 4] {
        let rot = Vec2::from_angle(self.angle);
        self.shape
            .local_vertices()
            .map(|v| self.position + rot.rotate(v))
    }

    /// Unit normals of the four edges, in edge order.
    pub fn axes(&self) -> [Vec2; 4] {
        let v = self.vertices();
        core::array::from_fn(|i| (v[(i + 1) % 4] - v[i]).perpendicular().unit_or_zero())
    }

    /// World-space axis-aligned bounds `(min, max)`.
    pub fn aabb(&self) -> (Vec2, Vec2) {
        let v = self.vertices();
        let mut min = v[0];
        let mut max = v[0];
        for p in &v[1..] {
            min = min.min(*p);
            max = max.max(*p);
        }
        (min, max)
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        Narrowphase::point_in_polygon(p, &self.vertices())
    }

    /// Velocity of the material point at offset `r` from the centre.
    #[inline]
    pub fn velocity_at(&self, r: Vec2) -> Vec2 {
        self.velocity + spin_cross(self.angular_velocity, r)
    }

    /// Apply an impulse at offset `r`. Static bodies are left untouched.
    pub fn apply_impulse(&mut self, impulse: Vec2, r: Vec2) {
        if self.is_static() {
            return;
        }
        self.velocity += impulse * self.inv_mass;
        self.angular_velocity += r.cross(impulse) * self.inv_inertia;
    }

    /// Positional counterpart of `apply_impulse`: moves and turns the body.
    pub fn apply_displacement(&mut self, push: Vec2, r: Vec2) {
        if self.is_static() {
            return;
        }
        self.position += push * self.inv_mass;
        self.angle += r.cross(push) * self.inv_inertia;
    }

    pub fn view(&self) -> BodyView {
        BodyView {
            id: self.id,
            position: self.position,
            angle: self.angle,
            half_extents: self.half_extents(),
            velocity: self.velocity,
            is_static: self.is_static(),
            color: self.color,
        }
    }
}
