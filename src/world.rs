use glam::Vec2;
use log::{debug, warn};

use std::time::Instant;

use crate::api::{NarrowphaseApi, PhysicsWorldApi};
use crate::body::RigidBody;
use crate::cache::{ContactCache, PairKey, RestingEntry};
use crate::contact::Contact;
use crate::error::WorldError;
use crate::narrowphase::Narrowphase;
use crate::rng::Pcg32;
use crate::solver;
use crate::types::*;

/// Fixed-step rigid-rectangle world.
pub struct PhysicsWorld {
    cfg: WorldConfig,
    tick: u64,
    paused: bool,
    gravity: Vec2,

    // Insertion order is render order; picking walks it backwards.
    bodies: Vec<RigidBody>,
    next_id: u64,
    rng: Pcg32,

    // Rebuilt every tick
    contacts: Vec<Contact>,
    // Survives across ticks, addressed by pair key only
    cache: ContactCache,

    pointer: Pointer,
    last_timing: Option<WorldTiming>,
}

#[derive(Copy, Clone, Debug, Default)]
struct Pointer {
    position: Vec2,
    down: bool,
    grabbed: Option<BodyId>,
    offset: Vec2,
}

impl PhysicsWorldApi for PhysicsWorld {
    fn new(cfg: WorldConfig) -> Result<Self, WorldError> {
        if let Err(e) = cfg.validate() {
            warn!("rejecting world configuration: {e}");
            return Err(e);
        }
        let mut world = Self {
            gravity: cfg.gravity(),
            rng: Pcg32::new(cfg.spawn.seed),
            cfg,
            tick: 0,
            paused: false,
            bodies: Vec::new(),
            next_id: 0,
            contacts: Vec::new(),
            cache: ContactCache::new(),
            pointer: Pointer::default(),
            last_timing: None,
        };
        world.populate()?;
        Ok(world)
    }

    fn step(&mut self) {
        if self.paused {
            return;
        }
        let t_all = if self.cfg.enable_timing { Some(Instant::now()) } else { None };
        self.tick += 1;

        self.detect();
        let detect_ms = t_all.map(|t| t.elapsed().as_secs_f64() * 1000.0).unwrap_or(0.0);

        let t_solve = if self.cfg.enable_timing { Some(Instant::now()) } else { None };
        let sc = &self.cfg.solver;
        solver::separate(&mut self.bodies, &mut self.contacts, sc);
        integrate(&mut self.bodies, self.gravity);
        for c in &mut self.contacts {
            c.prepare(&self.bodies[c.a], &self.bodies[c.b]);
        }
        solver::resting_pass(&mut self.bodies, &mut self.contacts, &self.cache, sc);
        solver::correction_pass(&self.bodies, &mut self.contacts, &mut self.cache, sc);
        solver::collision_pass(&mut self.bodies, &mut self.contacts, sc);
        let solve_ms = t_solve.map(|t| t.elapsed().as_secs_f64() * 1000.0).unwrap_or(0.0);

        self.drag_grabbed();
        self.cache.evict(self.tick, self.cfg.eviction_ticks());

        if let Some(t_all) = t_all {
            self.last_timing = Some(WorldTiming {
                step_ms: t_all.elapsed().as_secs_f64() * 1000.0,
                detect_ms,
                solve_ms,
            });
        }
    }

    fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        debug!("world {} at tick {}", if self.paused { "paused" } else { "resumed" }, self.tick);
        self.paused
    }

    fn add_body(&mut self, desc: BodyDesc) -> Result<BodyId, WorldError> {
        let id = BodyId(self.next_id);
        let body = RigidBody::from_desc(id, &desc).inspect_err(|e| warn!("rejecting body: {e}"))?;
        self.next_id += 1;
        self.bodies.push(body);
        Ok(id)
    }

    fn reset(&mut self) {
        self.bodies.clear();
        self.contacts.clear();
        self.cache.clear();
        self.tick = 0;
        self.paused = false;
        self.pointer = Pointer::default();
        self.last_timing = None;
        self.gravity = self.cfg.gravity();
        self.rng = Pcg32::new(self.cfg.spawn.seed);
        if let Err(e) = self.populate() {
            warn!("world reset left incomplete: {e}");
        }
        debug!("world reset: {} bodies, seed {}", self.bodies.len(), self.cfg.spawn.seed);
    }

    fn bodies(&self) -> Vec<BodyView> {
        self.bodies.iter().map(RigidBody::view).collect()
    }

    fn contacts(&self) -> Vec<ContactView> {
        self.contacts
            .iter()
            .map(|c| ContactView {
                a: self.bodies[c.a].id,
                b: self.bodies[c.b].id,
                normal: c.normal,
                points: c.points.iter().map(|p| p.position).collect(),
            })
            .collect()
    }

    fn pointer_down(&mut self, p: Vec2) {
        self.pointer.position = p;
        self.pointer.down = true;
        let hit = self
            .bodies
            .iter()
            .rev()
            .find(|b| !b.is_static() && b.contains_point(p));
        match hit {
            Some(b) => {
                debug!("grabbed body {:?}", b.id);
                self.pointer.grabbed = Some(b.id);
                self.pointer.offset = p - b.position;
            }
            None => {
                self.pointer.grabbed = None;
                self.pointer.offset = Vec2::ZERO;
            }
        }
    }

    fn pointer_move(&mut self, p: Vec2) {
        self.pointer.position = p;
    }

    fn pointer_up(&mut self) {
        if let Some(id) = self.pointer.grabbed {
            debug!("released body {:?}", id);
        }
        self.pointer.down = false;
        self.pointer.grabbed = None;
        self.pointer.offset = Vec2::ZERO;
    }
}

impl PhysicsWorld {
    /// Ground strip plus the configured number of random boxes.
    fn populate(&mut self) -> Result<(), WorldError> {
        if let Some(thickness) = self.cfg.ground_thickness {
            let (w, h) = (self.cfg.width, self.cfg.height);
            self.add_body(BodyDesc::fixed(
                Vec2::new(w * 0.5, h - thickness * 0.5),
                Vec2::new(w, thickness),
            ))?;
        }
        for _ in 0..self.cfg.spawn.initial_boxes {
            self.spawn_box()?;
        }
        Ok(())
    }

    /// Spawn one box with random size, pose, mass and colour in the upper half of the world.
    pub fn spawn_box(&mut self) -> Result<BodyId, WorldError> {
        let (w, h) = (self.cfg.width, self.cfg.height);
        let sp = &self.cfg.spawn;
        let (size_range, mass_range, material) = (sp.size_range, sp.mass_range, sp.material);
        let rng = &mut self.rng;
        let size = Vec2::new(rng.range(size_range.0, size_range.1), rng.range(size_range.0, size_range.1));
        let position = Vec2::new(rng.range(size.x, w - size.x), rng.range(size.y, h * 0.5));
        let angle = rng.range(0.0, core::f32::consts::TAU);
        let mass = rng.range(mass_range.0, mass_range.1);
        let color = Rgb::from_hsl(rng.range(0.0, 360.0), 0.7, 0.6);
        let id = self.add_body(
            BodyDesc::dynamic(position, size, mass)
                .with_angle(angle)
                .with_material(material)
                .with_color(color),
        )?;
        debug!("spawned box {:?} at ({:.1}, {:.1})", id, position.x, position.y);
        Ok(id)
    }

    /// All colliding pairs, in body insertion order. Touches the resting cache.
    fn detect(&mut self) {
        self.contacts.clear();
        let aabbs: Vec<(Vec2, Vec2)> = self.bodies.iter().map(RigidBody::aabb).collect();
        for i in 0..self.bodies.len() {
            for j in (i + 1)..self.bodies.len() {
                let ((min_a, max_a), (min_b, max_b)) = (aabbs[i], aabbs[j]);
                if max_a.x < min_b.x || max_b.x < min_a.x || max_a.y < min_b.y || max_b.y < min_a.y {
                    continue;
                }
                let (a, b) = (&self.bodies[i], &self.bodies[j]);
                if let Some(m) = Narrowphase::collide(a, b) {
                    let key = PairKey::new(a.id, b.id);
                    self.cache.touch(key, self.tick);
                    self.contacts.push(Contact::new(i, j, key, m));
                }
            }
        }
    }

    /// Ease the grabbed body towards the pointer and bleed off its motion.
    fn drag_grabbed(&mut self) {
        let Some(id) = self.pointer.grabbed else {
            return;
        };
        let target = self.pointer.position - self.pointer.offset;
        let (follow, damping) = (self.cfg.grab_follow, self.cfg.grab_damping);
        if let Some(b) = self.bodies.iter_mut().find(|b| b.id == id && !b.is_static()) {
            b.position += (target - b.position) * follow;
            b.velocity *= damping;
            b.angular_velocity *= damping;
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.cfg
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn body(&self, id: BodyId) -> Option<&RigidBody> {
        self.bodies.iter().find(|b| b.id == id)
    }

    /// Direct access for host-side nudges between steps. Only pose and
    /// velocity are writable; identity and mass stay as constructed.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }

    /// Add `impulse` at the centre of body `id` between steps. Static bodies
    /// ignore it. Returns false when no such body exists.
    ///
    /// The velocity change is integrated by the next `step` before the
    /// contact passes run, so a resting body still moves by one tick's worth
    /// of it even when friction then cancels the velocity.
    pub fn apply_impulse(&mut self, id: BodyId, impulse: Vec2) -> bool {
        match self.body_mut(id) {
            Some(b) => {
                b.apply_impulse(impulse, Vec2::ZERO);
                true
            }
            None => false,
        }
    }

    /// Contacts of the last step with their solver data.
    pub fn raw_contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn resting_entry(&self, a: BodyId, b: BodyId) -> Option<&RestingEntry> {
        self.cache.get(PairKey::new(a, b))
    }

    pub fn grabbed(&self) -> Option<BodyId> {
        self.pointer.grabbed
    }

    pub fn pointer_is_down(&self) -> bool {
        self.pointer.down
    }

    /// Return debug stats for the current tick.
    pub fn debug_stats(&self) -> WorldStats {
        WorldStats {
            bodies: self.bodies.len(),
            contacts: self.contacts.len(),
            contact_points: self.contacts.iter().map(|c| c.points.len()).sum(),
            cached_pairs: self.cache.len(),
        }
    }

    /// Return timing breakdown for the last step (when `enable_timing`).
    pub fn timing(&self) -> Option<WorldTiming> {
        self.last_timing
    }
}

/// Gravity into velocity and the per-tick accumulator, then symplectic Euler.
fn integrate(bodies: &mut [RigidBody], g: Vec2) {
    for b in bodies.iter_mut().filter(|b| !b.is_static()) {
        b.delta_velocity = g;
        b.delta_angular_velocity = 0.0;
        b.velocity += g;
        b.position += b.velocity;
        b.angle += b.angular_velocity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_cfg() -> WorldConfig {
        let mut cfg = WorldConfig {
            ground_thickness: None,
            gravity_strength: 0.0,
            ..Default::default()
        };
        cfg.spawn.initial_boxes = 0;
        cfg
    }

    #[test]
    fn test_new_populates_ground_and_boxes() {
        let w = PhysicsWorld::new(WorldConfig::default()).unwrap();
        let bodies = w.bodies();
        assert_eq!(bodies.len(), 9);
        assert!(bodies[0].is_static);
        assert!(bodies[1..].iter().all(|b| !b.is_static));
        for pair in bodies.windows(2) {
            assert!(pair[0].id < pair[1].id);
        }
        for b in &bodies[1..] {
            assert!(b.position.y <= 300.0);
            assert!(b.half_extents.x >= 10.0 && b.half_extents.x <= 40.0);
        }
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let cfg = WorldConfig { tick_rate: 0, ..Default::default() };
        assert!(PhysicsWorld::new(cfg).is_err());
    }

    #[test]
    fn test_add_body_rejects_without_consuming_id() {
        let mut w = PhysicsWorld::new(empty_cfg()).unwrap();
        let a = w.add_body(BodyDesc::dynamic(Vec2::ZERO, Vec2::ONE, 1.0)).unwrap();
        assert!(w.add_body(BodyDesc::dynamic(Vec2::ZERO, Vec2::new(-1.0, 1.0), 1.0)).is_err());
        let b = w.add_body(BodyDesc::dynamic(Vec2::ZERO, Vec2::ONE, 1.0)).unwrap();
        assert_eq!(b.0, a.0 + 1);
        assert_eq!(w.bodies().len(), 2);
    }

    #[test]
    fn test_paused_step_is_noop() {
        let mut w = PhysicsWorld::new(WorldConfig::default()).unwrap();
        assert!(w.toggle_pause());
        let before = w.bodies();
        w.step();
        assert_eq!(w.tick(), 0);
        assert_eq!(w.bodies(), before);
        assert!(!w.toggle_pause());
        w.step();
        assert_eq!(w.tick(), 1);
        assert_ne!(w.bodies(), before);
    }

    #[test]
    fn test_gravity_integrates_dynamic_only() {
        let mut cfg = empty_cfg();
        cfg.gravity_strength = 6.0;
        let mut w = PhysicsWorld::new(cfg).unwrap();
        let wall = w.add_body(BodyDesc::fixed(Vec2::new(0.0, 0.0), Vec2::splat(10.0))).unwrap();
        let ball = w.add_body(BodyDesc::dynamic(Vec2::new(100.0, 0.0), Vec2::splat(10.0), 1.0)).unwrap();
        w.step();
        w.step();
        let g = 6.0 / 60.0;
        let b = w.body(ball).unwrap();
        assert!((b.velocity.y - 2.0 * g).abs() < 1e-6);
        assert!((b.position.y - 3.0 * g).abs() < 1e-6);
        assert!((b.delta_velocity.y - g).abs() < 1e-6);
        assert_eq!(w.body(wall).unwrap().position, Vec2::ZERO);
    }

    #[test]
    fn test_apply_impulse_scales_by_mass_and_skips_static() {
        let mut w = PhysicsWorld::new(empty_cfg()).unwrap();
        let wall = w.add_body(BodyDesc::fixed(Vec2::ZERO, Vec2::splat(10.0))).unwrap();
        let heavy = w.add_body(BodyDesc::dynamic(Vec2::new(100.0, 0.0), Vec2::splat(10.0), 4.0)).unwrap();
        assert!(w.apply_impulse(heavy, Vec2::new(2.0, -1.0)));
        assert!(w.apply_impulse(wall, Vec2::new(2.0, -1.0)));
        assert!(!w.apply_impulse(BodyId(99), Vec2::X));
        let b = w.body(heavy).unwrap();
        assert_eq!(b.velocity, Vec2::new(0.5, -0.25));
        assert_eq!(b.angular_velocity, 0.0);
        let s = w.body(wall).unwrap();
        assert_eq!(s.velocity, Vec2::ZERO);
        assert_eq!(s.inv_mass(), 0.0);
        assert_eq!(s.id(), wall);
    }

    #[test]
    fn test_new_rejects_bad_spawn_material() {
        let mut cfg = WorldConfig::default();
        cfg.spawn.material.static_friction = -1.0;
        assert!(matches!(
            PhysicsWorld::new(cfg),
            Err(WorldError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_reset_rebuilds_same_world() {
        let mut w = PhysicsWorld::new(WorldConfig::default()).unwrap();
        let first: Vec<_> = w.bodies().into_iter().map(|b| (b.position, b.angle, b.half_extents, b.color)).collect();
        for _ in 0..30 {
            w.step();
        }
        w.pointer_down(Vec2::new(-1000.0, -1000.0));
        w.reset();
        assert_eq!(w.tick(), 0);
        assert!(w.raw_contacts().is_empty());
        assert_eq!(w.debug_stats().cached_pairs, 0);
        assert!(!w.pointer_is_down());
        let again: Vec<_> = w.bodies().into_iter().map(|b| (b.position, b.angle, b.half_extents, b.color)).collect();
        assert_eq!(first, again);
        // Ids keep counting: identities are never reused.
        assert!(w.bodies()[0].id.0 >= 9);
    }

    #[test]
    fn test_cache_entry_refreshed_while_touching() {
        let mut w = PhysicsWorld::new(empty_cfg()).unwrap();
        // Two overlapping statics: reported every tick, never pushed apart.
        let a = w.add_body(BodyDesc::fixed(Vec2::ZERO, Vec2::splat(100.0))).unwrap();
        let b = w.add_body(BodyDesc::fixed(Vec2::new(80.0, 0.0), Vec2::splat(100.0))).unwrap();
        for _ in 0..5 {
            w.step();
            let e = w.resting_entry(b, a).expect("pair still overlapping");
            assert_eq!(e.last_contact, w.tick());
            assert_eq!(e.key, PairKey::new(a, b));
        }
        assert_eq!(w.debug_stats().cached_pairs, 1);
    }

    #[test]
    fn test_cache_entry_evicted_after_window() {
        let mut w = PhysicsWorld::new(empty_cfg()).unwrap();
        // Two overlapping statics: reported every tick, never pushed apart.
        let a = w.add_body(BodyDesc::fixed(Vec2::ZERO, Vec2::splat(100.0))).unwrap();
        let b = w.add_body(BodyDesc::fixed(Vec2::new(80.0, 0.0), Vec2::splat(100.0))).unwrap();
        w.step();
        let t = w.tick();
        assert_eq!(w.resting_entry(a, b).unwrap().last_contact, t);

        w.body_mut(b).unwrap().position = Vec2::new(5000.0, 0.0);
        let window = w.config().eviction_ticks();
        while w.tick() < t + window {
            w.step();
            assert!(w.resting_entry(a, b).is_some(), "evicted early at tick {}", w.tick());
        }
        w.step();
        assert_eq!(w.tick(), t + window + 1);
        assert!(w.resting_entry(a, b).is_none());
    }

    #[test]
    fn test_pick_topmost_dynamic() {
        let mut w = PhysicsWorld::new(empty_cfg()).unwrap();
        let floor = w.add_body(BodyDesc::fixed(Vec2::new(0.0, 50.0), Vec2::new(400.0, 40.0))).unwrap();
        let under = w.add_body(BodyDesc::dynamic(Vec2::ZERO, Vec2::splat(40.0), 1.0)).unwrap();
        let over = w.add_body(BodyDesc::dynamic(Vec2::new(30.0, 0.0), Vec2::splat(40.0), 1.0)).unwrap();

        w.pointer_down(Vec2::new(-15.0, 0.0));
        assert_eq!(w.grabbed(), Some(under));
        w.pointer_up();
        assert_eq!(w.grabbed(), None);

        w.pointer_down(Vec2::new(15.0, 0.0));
        assert_eq!(w.grabbed(), Some(over));
        w.pointer_up();

        w.pointer_down(Vec2::new(150.0, 50.0));
        assert!(w.body(floor).unwrap().contains_point(Vec2::new(150.0, 50.0)));
        assert_eq!(w.grabbed(), None);
        w.pointer_up();

        w.pointer_down(Vec2::new(0.0, -500.0));
        assert_eq!(w.grabbed(), None);
        assert!(w.pointer_is_down());
    }

    #[test]
    fn test_drag_follows_pointer_and_damps() {
        let mut w = PhysicsWorld::new(empty_cfg()).unwrap();
        let id = w
            .add_body(BodyDesc::dynamic(Vec2::ZERO, Vec2::splat(20.0), 1.0).with_velocity(Vec2::new(1.0, 0.0)))
            .unwrap();
        w.pointer_down(Vec2::new(5.0, 0.0));
        w.pointer_move(Vec2::new(105.0, 0.0));
        w.step();
        let b = w.body(id).unwrap();
        // Moved by its velocity (1.0), then 10% of the remaining 99.
        assert!((b.position.x - (1.0 + 0.1 * 99.0)).abs() < 1e-4);
        assert!((b.velocity.x - 0.6).abs() < 1e-6);
        w.pointer_up();
        w.step();
        assert!((w.body(id).unwrap().velocity.x - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_contacts_view_and_stats() {
        let mut w = PhysicsWorld::new(empty_cfg()).unwrap();
        let a = w.add_body(BodyDesc::fixed(Vec2::ZERO, Vec2::splat(10.0))).unwrap();
        let b = w.add_body(BodyDesc::dynamic(Vec2::new(4.0, 4.0), Vec2::splat(4.0), 1.0)).unwrap();
        w.add_body(BodyDesc::dynamic(Vec2::new(300.0, 0.0), Vec2::splat(4.0), 1.0)).unwrap();
        w.step();
        let views = w.contacts();
        assert_eq!(views.len(), 1);
        assert_eq!((views[0].a, views[0].b), (a, b));
        assert!(!views[0].points.is_empty());
        let stats = w.debug_stats();
        assert_eq!(stats.bodies, 3);
        assert_eq!(stats.contacts, 1);
        assert_eq!(stats.contact_points, views[0].points.len());
        assert!(w.timing().is_none());
    }

    #[test]
    fn test_timing_recorded_when_enabled() {
        let cfg = WorldConfig { enable_timing: true, ..Default::default() };
        let mut w = PhysicsWorld::new(cfg).unwrap();
        w.step();
        let t = w.timing().unwrap();
        assert!(t.step_ms >= t.solve_ms);
    }
}
