use glam::Vec2;
use restbox::*;

fn main() {
    let mut world = PhysicsWorld::new(WorldConfig::default()).expect("default config is valid");

    // Let the random boxes land first.
    for _ in 0..240 {
        world.step();
    }

    let Some(target) = world.bodies().into_iter().rev().find(|b| !b.is_static) else {
        println!("nothing to grab");
        return;
    };
    world.pointer_down(target.position);
    println!("pointer down at ({:.1},{:.1}) grabbed={:?}", target.position.x, target.position.y, world.grabbed());

    // Sweep the pointer in an arc over the pile.
    for i in 0..180 {
        let t = i as f32 / 180.0;
        let p = Vec2::new(200.0 + 400.0 * t, 150.0 + 100.0 * (t * core::f32::consts::PI).sin());
        world.pointer_move(p);
        world.step();
        if i % 30 == 0 {
            if let Some(b) = world.body(target.id) {
                println!(
                    "tick {}: pointer=({:.1},{:.1}) box=({:.1},{:.1})",
                    world.tick(),
                    p.x,
                    p.y,
                    b.position.x,
                    b.position.y
                );
            }
        }
    }
    world.pointer_up();

    for _ in 0..240 {
        world.step();
    }
    for c in world.contacts() {
        println!(
            "contact {:?} vs {:?} n=({:.2},{:.2}) points={}",
            c.a,
            c.b,
            c.normal.x,
            c.normal.y,
            c.points.len()
        );
    }
}
