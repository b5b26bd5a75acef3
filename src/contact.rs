use glam::Vec2;

use crate::body::RigidBody;
use crate::cache::PairKey;
use crate::math::Vec2Ext;

/// One contact point of a manifold.
#[derive(Copy, Clone, Debug)]
pub struct ContactPoint {
    /// World-space location.
    pub position: Vec2,
    /// Per-point penetration estimate (see `Narrowphase::collide`).
    pub penetration: f32,
    /// Collision mass along the normal, computed on first use this tick.
    pub normal_mass: Option<f32>,
    /// Collision mass along the tangent, computed on first use this tick.
    pub tangent_mass: Option<f32>,
    /// Normal impulse magnitude recorded by the resting pass; bounds friction
    /// in the later passes.
    pub normal_force: f32,
}

impl ContactPoint {
    pub fn new(position: Vec2, penetration: f32) -> Self {
        Self {
            position,
            penetration,
            normal_mass: None,
            tangent_mass: None,
            normal_force: 0.0,
        }
    }
}

/// Narrowphase output: shared normal/tangent plus the contact points.
#[derive(Clone, Debug)]
pub struct Manifold {
    /// Unit normal pointing from A's centroid towards B's.
    pub normal: Vec2,
    pub tangent: Vec2,
    /// Smallest SAT overlap over all tested axes.
    pub min_overlap: f32,
    pub points: Vec<ContactPoint>,
}

/// A colliding pair for the current tick.
///
/// `a`/`b` index the world's body list and are only valid for the tick that
/// produced the contact; `key` addresses the pair's resting cache entry.
#[derive(Clone, Debug)]
pub struct Contact {
    pub a: usize,
    pub b: usize,
    pub key: PairKey,
    pub normal: Vec2,
    pub tangent: Vec2,
    pub min_overlap: f32,
    pub points: Vec<ContactPoint>,
}

impl Contact {
    pub fn new(a: usize, b: usize, key: PairKey, manifold: Manifold) -> Self {
        Self {
            a,
            b,
            key,
            normal: manifold.normal,
            tangent: manifold.tangent,
            min_overlap: manifold.min_overlap,
            points: manifold.points,
        }
    }

    /// Fill in any collision masses not computed yet this tick.
    pub fn prepare(&mut self, a: &RigidBody, b: &RigidBody) {
        let (normal, tangent) = (self.normal, self.tangent);
        for p in &mut self.points {
            normal_mass(p, a, b, normal);
            tangent_mass(p, a, b, tangent);
        }
    }
}

/// Effective mass of the pair at `point` along `dir`; zero when both
/// bodies are immovable along it.
pub fn collision_mass(a: &RigidBody, b: &RigidBody, point: Vec2, dir: Vec2) -> f32 {
    let ra = point - a.position;
    let rb = point - b.position;
    let ca = ra.cross(dir);
    let cb = rb.cross(dir);
    let k = a.inv_mass + b.inv_mass + ca * ca * a.inv_inertia + cb * cb * b.inv_inertia;
    if k > 0.0 { 1.0 / k } else { 0.0 }
}

pub fn normal_mass(p: &mut ContactPoint, a: &RigidBody, b: &RigidBody, normal: Vec2) -> f32 {
    let at = p.position;
    *p.normal_mass.get_or_insert_with(|| collision_mass(a, b, at, normal))
}

pub fn tangent_mass(p: &mut ContactPoint, a: &RigidBody, b: &RigidBody, tangent: Vec2) -> f32 {
    let at = p.position;
    *p.tangent_mass.get_or_insert_with(|| collision_mass(a, b, at, tangent))
}
