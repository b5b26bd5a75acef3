//! Sequential-impulse contact solver.
//!
//! A tick runs one position pass and three velocity passes over the contact
//! list, each a single sweep in contact order then point order:
//!
//! 1. [`separate`]: push penetrating pairs apart beyond the slop.
//! 2. [`resting_pass`]: solve against `velocity - resting bias` and record the
//!    normal force each point carries; applied to real velocities.
//! 3. [`correction_pass`]: solve the remaining error on real velocities and fold
//!    the result into the pair's resting bias only.
//! 4. [`collision_pass`]: same construction as the correction pass, applied to
//!    real velocities; separating points are left alone.
//!
//! Impulses follow one convention throughout: relative velocity is
//! `v_A(point) - v_B(point)`, and an impulse `P` is added to A and subtracted
//! from B.
//!
//! Friction reaches real velocities twice per tick: once in the resting pass,
//! bounded by the resting normal force, and again in the collision pass,
//! bounded by that force plus the collision impulse. A sliding box therefore
//! loses more than `dynamic_friction * g` per tick, up to roughly twice that.
//!
//! Bodies are integrated before these passes run, so velocity a host adds
//! between steps moves a body for one tick before friction can cancel it.

use glam::Vec2;

use crate::body::RigidBody;
use crate::cache::{ContactCache, RestingBias};
use crate::contact::{Contact, ContactPoint, normal_mass, tangent_mass};
use crate::math::{Vec2Ext, spin_cross};
use crate::types::SolverConfig;

/// Linear and angular velocity a pass reads for one body.
#[derive(Copy, Clone, Debug)]
struct Motion {
    velocity: Vec2,
    spin: f32,
}

impl Motion {
    fn of(b: &RigidBody) -> Self {
        Self {
            velocity: b.velocity,
            spin: b.angular_velocity,
        }
    }

    fn without(self, bias: RestingBias) -> Self {
        Self {
            velocity: self.velocity - bias.velocity,
            spin: self.spin - bias.angular_velocity,
        }
    }

    #[inline]
    fn at(self, r: Vec2) -> Vec2 {
        self.velocity + spin_cross(self.spin, r)
    }
}

/// Combined friction of a pair: the smaller coefficient of each kind.
#[derive(Copy, Clone, Debug)]
struct Friction {
    fixed: f32,
    sliding: f32,
}

impl Friction {
    fn between(a: &RigidBody, b: &RigidBody) -> Self {
        Self {
            fixed: a.material.static_friction.min(b.material.static_friction),
            sliding: a.material.dynamic_friction.min(b.material.dynamic_friction),
        }
    }

    /// Keep `jt` if it fits under the static bound, else slide at the dynamic bound.
    fn clamp(self, jt: f32, force: f32) -> f32 {
        if jt.abs() <= force * self.fixed {
            jt
        } else {
            jt.signum() * force * self.sliding
        }
    }
}

/// Geometry of one contact point, resolved against the bodies' current poses.
#[derive(Copy, Clone, Debug)]
struct PointFrame {
    ra: Vec2,
    rb: Vec2,
    normal: Vec2,
    tangent: Vec2,
    normal_mass: f32,
    tangent_mass: f32,
}

impl PointFrame {
    fn new(p: &mut ContactPoint, a: &RigidBody, b: &RigidBody, normal: Vec2, tangent: Vec2) -> Self {
        Self {
            ra: p.position - a.position,
            rb: p.position - b.position,
            normal,
            tangent,
            normal_mass: normal_mass(p, a, b, normal),
            tangent_mass: tangent_mass(p, a, b, tangent),
        }
    }

    #[inline]
    fn relative(&self, a: Motion, b: Motion) -> Vec2 {
        a.at(self.ra) - b.at(self.rb)
    }

    /// Signed normal impulse; approaching points yield a negative value.
    fn normal_impulse(&self, a: Motion, b: Motion, restitution: f32, reject_separating: bool) -> f32 {
        let vn = self.relative(a, b).dot(self.normal);
        if reject_separating && vn < 0.0 {
            return 0.0;
        }
        -(1.0 + restitution) * vn * self.normal_mass
    }

    fn friction_impulse(&self, a: Motion, b: Motion, force: f32, friction: Friction) -> f32 {
        let vt = self.relative(a, b).dot(self.tangent);
        friction.clamp(-vt * self.tangent_mass, force)
    }

    fn combine(&self, jn: f32, jt: f32) -> Vec2 {
        self.normal * jn + self.tangent * jt
    }
}

/// Mutable access to two distinct bodies.
fn pair_mut(bodies: &mut [RigidBody], i: usize, j: usize) -> (&mut RigidBody, &mut RigidBody) {
    debug_assert_ne!(i, j, "a body cannot collide with itself");
    if i < j {
        let (lo, hi) = bodies.split_at_mut(j);
        (&mut lo[i], &mut hi[0])
    } else {
        let (lo, hi) = bodies.split_at_mut(i);
        (&mut hi[0], &mut lo[j])
    }
}

/// Add the velocity change `impulse` would give `body` into its resting bias.
fn accumulate(bias: &mut RestingBias, body: &RigidBody, impulse: Vec2, r: Vec2) {
    if body.is_static() {
        return;
    }
    bias.velocity += impulse * body.inv_mass;
    bias.angular_velocity += r.cross(impulse) * body.inv_inertia;
}

/// Position correction along the normal for every point deeper than the slop.
pub fn separate(bodies: &mut [RigidBody], contacts: &mut [Contact], cfg: &SolverConfig) {
    for c in contacts.iter_mut() {
        let (a, b) = pair_mut(bodies, c.a, c.b);
        for p in c.points.iter_mut() {
            let mass = normal_mass(p, a, b, c.normal);
            let depth = (p.penetration - cfg.slop).max(0.0);
            let push = -c.normal * (depth * mass * cfg.position_beta);
            let ra = p.position - a.position;
            let rb = p.position - b.position;
            a.apply_displacement(push, ra);
            b.apply_displacement(-push, rb);
        }
    }
}

/// Estimate the steady resting impulse from velocities with the cached bias removed.
///
/// Never rejects separating points, records `|jn|` per point as its normal
/// force, and writes to real velocities only.
pub fn resting_pass(bodies: &mut [RigidBody], contacts: &mut [Contact], cache: &ContactCache, cfg: &SolverConfig) {
    for c in contacts.iter_mut() {
        let (a, b) = pair_mut(bodies, c.a, c.b);
        let bias_a = cache.bias(c.key, a.id);
        let bias_b = cache.bias(c.key, b.id);
        let friction = Friction::between(a, b);
        for p in c.points.iter_mut() {
            let f = PointFrame::new(p, a, b, c.normal, c.tangent);
            let ma = Motion::of(a).without(bias_a);
            let mb = Motion::of(b).without(bias_b);
            let jn = f.normal_impulse(ma, mb, cfg.restitution, false);
            p.normal_force = jn.abs();
            let jt = f.friction_impulse(ma, mb, p.normal_force, friction);
            let impulse = f.combine(jn, jt);
            a.apply_impulse(impulse, f.ra);
            b.apply_impulse(-impulse, f.rb);
        }
    }
}

/// Measure what real velocities still need and fold it into the resting bias.
///
/// Bodies are not modified. Friction is bounded by the resting normal force
/// plus this pass' normal impulse.
pub fn correction_pass(bodies: &[RigidBody], contacts: &mut [Contact], cache: &mut ContactCache, cfg: &SolverConfig) {
    for c in contacts.iter_mut() {
        let (a, b) = (&bodies[c.a], &bodies[c.b]);
        let Some(entry) = cache.get_mut(c.key) else {
            continue;
        };
        let friction = Friction::between(a, b);
        let mut bias_a = entry.bias(a.id);
        let mut bias_b = entry.bias(b.id);
        for p in c.points.iter_mut() {
            let f = PointFrame::new(p, a, b, c.normal, c.tangent);
            let ma = Motion::of(a);
            let mb = Motion::of(b);
            let jn = f.normal_impulse(ma, mb, cfg.restitution, cfg.correction_rejects_separating);
            let mb_friction = if cfg.correction_friction_uses_delta_spin {
                Motion {
                    velocity: b.velocity,
                    spin: b.delta_angular_velocity,
                }
            } else {
                mb
            };
            let jt = f.friction_impulse(ma, mb_friction, p.normal_force + jn.abs(), friction);
            let impulse = f.combine(jn, jt);
            accumulate(&mut bias_a, a, impulse, f.ra);
            accumulate(&mut bias_b, b, -impulse, f.rb);
        }
        *entry.bias_mut(a.id) = bias_a;
        *entry.bias_mut(b.id) = bias_b;
    }
}

/// Stop approaching motion at every point; applied to real velocities.
pub fn collision_pass(bodies: &mut [RigidBody], contacts: &mut [Contact], cfg: &SolverConfig) {
    for c in contacts.iter_mut() {
        let (a, b) = pair_mut(bodies, c.a, c.b);
        let friction = Friction::between(a, b);
        for p in c.points.iter_mut() {
            let f = PointFrame::new(p, a, b, c.normal, c.tangent);
            let ma = Motion::of(a);
            let mb = Motion::of(b);
            let jn = f.normal_impulse(ma, mb, cfg.restitution, true);
            let jt = f.friction_impulse(ma, mb, p.normal_force + jn.abs(), friction);
            let impulse = f.combine(jn, jt);
            a.apply_impulse(impulse, f.ra);
            b.apply_impulse(-impulse, f.rb);
        }
    }
}
