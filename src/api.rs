use glam::Vec2;

use crate::body::RigidBody;
use crate::contact::Manifold;
use crate::error::WorldError;
use crate::types::*;

/// Public contract of the simulation world consumed by a host loop.
pub trait PhysicsWorldApi {
    /// Construct a world, place the ground and spawn the configured boxes.
    fn new(cfg: WorldConfig) -> Result<Self, WorldError>
    where
        Self: Sized;

    // --- Stepping ----------------------------------------------------------

    /// Advance one fixed tick. Does nothing while paused.
    fn step(&mut self);

    /// Flip the pause flag and return the new state.
    fn toggle_pause(&mut self) -> bool;

    // --- Lifecycle ---------------------------------------------------------

    /// Insert a body at the top of the stacking/picking order.
    fn add_body(&mut self, desc: BodyDesc) -> Result<BodyId, WorldError>;

    /// Discard every body, contact and cache entry, then rebuild the world
    /// from the configured seed.
    fn reset(&mut self);

    // --- Queries -----------------------------------------------------------

    /// Render snapshot of all bodies, in insertion order.
    fn bodies(&self) -> Vec<BodyView>;

    /// Contacts found by the last step.
    fn contacts(&self) -> Vec<ContactView>;

    // --- Pointer interaction (world coordinates) ---------------------------

    /// Grab the topmost dynamic body under `p`, if any.
    fn pointer_down(&mut self, p: Vec2);

    fn pointer_move(&mut self, p: Vec2);

    /// Release whatever is grabbed.
    fn pointer_up(&mut self);
}

/// Rectangle-vs-rectangle narrowphase primitives.
pub trait NarrowphaseApi {
    /// Separating-axis test. `None` when any tested axis separates the pair.
    fn collide(a: &RigidBody, b: &RigidBody) -> Option<Manifold>;

    /// `(min, max)` of the polygon's projection onto `axis`.
    fn project(verts: &[Vec2], axis: Vec2) -> (f32, f32);

    /// Inside-or-on-boundary test for a convex polygon of either winding.
    fn point_in_polygon(p: Vec2, verts: &[Vec2]) -> bool;
}
