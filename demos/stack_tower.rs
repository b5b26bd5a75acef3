use glam::Vec2;
use restbox::*;

fn main() {
    let mut cfg = WorldConfig {
        enable_timing: true,
        ..Default::default()
    };
    cfg.spawn.initial_boxes = 0;
    let mut world = PhysicsWorld::new(cfg).expect("default config is valid");

    let levels = 8usize;
    let size = Vec2::new(60.0, 24.0);
    let mut ids = Vec::with_capacity(levels);
    for i in 0..levels {
        // Slight stagger so the tower has to hold itself up through friction.
        let x = 400.0 + if i % 2 == 0 { 3.0 } else { -3.0 };
        let y = 560.0 - size.y * (i as f32 + 0.5);
        let id = world
            .add_body(BodyDesc::dynamic(Vec2::new(x, y), size, 1.0).with_color(Rgb::from_hsl(i as f32 * 40.0, 0.7, 0.6)))
            .expect("tower block");
        ids.push(id);
    }

    let ticks = 600;
    let mut worst_ms = 0.0f64;
    for _ in 0..ticks {
        world.step();
        if let Some(t) = world.timing() {
            worst_ms = worst_ms.max(t.step_ms);
        }
    }

    let stats = world.debug_stats();
    println!(
        "tick={} bodies={} contacts={} points={} cached_pairs={} worst_step={:.3}ms",
        world.tick(),
        stats.bodies,
        stats.contacts,
        stats.contact_points,
        stats.cached_pairs,
        worst_ms
    );
    for (level, id) in ids.iter().enumerate() {
        if let Some(b) = world.body(*id) {
            println!(
                "level {level}: pos=({:.2},{:.2}) angle={:.4} v=({:.4},{:.4})",
                b.position.x, b.position.y, b.angle, b.velocity.x, b.velocity.y
            );
        }
    }
}
