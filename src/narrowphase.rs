use glam::Vec2;

use crate::api::NarrowphaseApi;
use crate::body::RigidBody;
use crate::contact::{ContactPoint, Manifold};
use crate::math::Vec2Ext;

/// Separating-axis narrowphase for rotated rectangles.
pub struct Narrowphase;

/// Least-overlap axis among one body's own edge normals.
#[derive(Copy, Clone, Debug)]
struct OwnAxis {
    axis: Vec2,
    overlap: f32,
    /// Projection interval of the axis owner's polygon.
    interval: (f32, f32),
}

impl OwnAxis {
    fn none() -> Self {
        Self {
            axis: Vec2::ZERO,
            overlap: f32::INFINITY,
            interval: (0.0, 0.0),
        }
    }

    fn offer(&mut self, axis: Vec2, overlap: f32, interval: (f32, f32)) {
        if overlap < self.overlap {
            *self = Self { axis, overlap, interval };
        }
    }

    /// Distance from `p`'s projection to the nearer end of the interval.
    fn depth(&self, p: Vec2) -> f32 {
        let d = p.dot(self.axis);
        (d - self.interval.0).min(self.interval.1 - d)
    }
}

fn centroid(verts: &[Vec2]) -> Vec2 {
    verts.iter().copied().sum::<Vec2>() / verts.len() as f32
}

impl NarrowphaseApi for Narrowphase {
    fn collide(a: &RigidBody, b: &RigidBody) -> Option<Manifold> {
        let va = a.vertices();
        let vb = b.vertices();

        let mut min_overlap = f32::INFINITY;
        let mut best_axis = Vec2::ZERO;
        let mut own_a = OwnAxis::none();
        let mut own_b = OwnAxis::none();

        // Near-duplicate axes (shared orientation) are tested anyway; they can
        // only repeat an overlap already seen.
        for (from_a, axes) in [(true, a.axes()), (false, b.axes())] {
            for axis in axes {
                let ia = Self::project(&va, axis);
                let ib = Self::project(&vb, axis);
                let overlap = ia.1.min(ib.1) - ia.0.max(ib.0);
                if overlap < 0.0 {
                    return None;
                }
                if overlap < min_overlap {
                    min_overlap = overlap;
                    best_axis = axis;
                }
                if from_a {
                    own_a.offer(axis, overlap, ia);
                } else {
                    own_b.offer(axis, overlap, ib);
                }
            }
        }

        let mut normal = best_axis;
        if normal.dot(centroid(&vb) - centroid(&va)) < 0.0 {
            normal = -normal;
        }

        let mut positions: Vec<Vec2> = va
            .iter()
            .copied()
            .filter(|p| Self::point_in_polygon(*p, &vb))
            .collect();
        positions.extend(vb.iter().copied().filter(|p| Self::point_in_polygon(*p, &va)));
        if positions.is_empty() {
            positions.push((a.position + b.position) * 0.5);
        }

        let points = positions
            .into_iter()
            .map(|p| ContactPoint::new(p, own_a.depth(p).max(own_b.depth(p))))
            .collect();

        Some(Manifold {
            normal,
            tangent: normal.perpendicular().unit_or_zero(),
            min_overlap,
            points,
        })
    }

    fn project(verts: &[Vec2], axis: Vec2) -> (f32, f32) {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for v in verts {
            let d = v.dot(axis);
            min = min.min(d);
            max = max.max(d);
        }
        (min, max)
    }

    fn point_in_polygon(p: Vec2, verts: &[Vec2]) -> bool {
        let n = verts.len();
        if n < 3 {
            return false;
        }
        let mut pos = false;
        let mut neg = false;
        for i in 0..n {
            let edge = verts[(i + 1) % n] - verts[i];
            let c = edge.cross(p - verts[i]);
            if c > 0.0 {
                pos = true;
            } else if c < 0.0 {
                neg = true;
            }
            if pos && neg {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Pcg32;
    use crate::types::*;

    fn rect(id: u64, pos: Vec2, size: Vec2, angle: f32) -> RigidBody {
        RigidBody::from_desc(BodyId(id), &BodyDesc::dynamic(pos, size, 1.0).with_angle(angle)).unwrap()
    }

    fn ground() -> RigidBody {
        RigidBody::from_desc(BodyId(0), &BodyDesc::fixed(Vec2::new(400.0, 580.0), Vec2::new(800.0, 40.0))).unwrap()
    }

    fn all_overlaps(a: &RigidBody, b: &RigidBody) -> Vec<f32> {
        let (va, vb) = (a.vertices(), b.vertices());
        a.axes()
            .into_iter()
            .chain(b.axes())
            .map(|axis| {
                let ia = Narrowphase::project(&va, axis);
                let ib = Narrowphase::project(&vb, axis);
                ia.1.min(ib.1) - ia.0.max(ib.0)
            })
            .collect()
    }

    #[test]
    fn test_separated_boxes() {
        let a = rect(1, Vec2::ZERO, Vec2::splat(2.0), 0.0);
        let b = rect(2, Vec2::new(3.1, 0.0), Vec2::splat(2.0), 0.0);
        assert!(Narrowphase::collide(&a, &b).is_none());
    }

    #[test]
    fn test_box_on_ground_two_corners() {
        let g = ground();
        let b = rect(1, Vec2::new(400.0, 546.0), Vec2::new(50.0, 30.0), 0.0);
        let m = Narrowphase::collide(&g, &b).unwrap();
        assert_eq!(m.normal, Vec2::new(0.0, -1.0));
        assert!((m.min_overlap - 1.0).abs() < 1e-4);
        assert_eq!(m.points.len(), 2);
        for p in &m.points {
            assert!((p.position.y - 561.0).abs() < 1e-4);
            assert!((p.penetration - 1.0).abs() < 1e-4);
            assert!(p.normal_mass.is_none());
        }
        assert!(m.tangent.dot(m.normal).abs() < 1e-6);
        assert!((m.tangent.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_points_list_a_vertices_first() {
        // Small box poking into the corner region of a bigger one.
        let a = rect(1, Vec2::ZERO, Vec2::splat(10.0), 0.0);
        let b = rect(2, Vec2::new(6.0, 6.0), Vec2::splat(4.0), 0.0);
        let m = Narrowphase::collide(&a, &b).unwrap();
        // A's corner (5,5) lies in B, B's corner (4,4) lies in A.
        assert_eq!(m.points.len(), 2);
        assert_eq!(m.points[0].position, Vec2::new(5.0, 5.0));
        assert_eq!(m.points[1].position, Vec2::new(4.0, 4.0));
    }

    #[test]
    fn test_crossed_bars_fall_back_to_midpoint() {
        let a = rect(1, Vec2::new(0.0, 0.0), Vec2::new(40.0, 4.0), 0.0);
        let b = rect(2, Vec2::new(2.0, 0.0), Vec2::new(4.0, 40.0), 0.0);
        let m = Narrowphase::collide(&a, &b).unwrap();
        assert_eq!(m.points.len(), 1);
        assert_eq!(m.points[0].position, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_rotated_diamond_hits_with_tip() {
        let g = ground();
        // Square rotated 45deg: lowest tip at y = 540 + 10*sqrt(2) ~ 554.1 -> lower it into the ground.
        let b = rect(1, Vec2::new(400.0, 552.0), Vec2::splat(20.0), core::f32::consts::FRAC_PI_4);
        let m = Narrowphase::collide(&g, &b).unwrap();
        assert_eq!(m.points.len(), 1);
        assert!(m.points[0].position.y > 560.0);
        assert!(m.normal.y < 0.0);
        let expected = 552.0 + 10.0 * core::f32::consts::SQRT_2 - 560.0;
        assert!((m.points[0].penetration - expected).abs() < 1e-3);
    }

    #[test]
    fn test_point_in_polygon_either_winding() {
        let ccw = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)];
        let mut cw = ccw;
        cw.reverse();
        for poly in [ccw, cw] {
            assert!(Narrowphase::point_in_polygon(Vec2::new(0.5, 0.5), &poly));
            assert!(Narrowphase::point_in_polygon(Vec2::new(1.0, 0.5), &poly));
            assert!(!Narrowphase::point_in_polygon(Vec2::new(1.5, 0.5), &poly));
        }
        assert!(!Narrowphase::point_in_polygon(Vec2::ZERO, &ccw[..2]));
    }

    #[test]
    fn test_sat_agrees_with_axis_overlaps() {
        let mut rng = Pcg32::new(99);
        let mut hits = 0;
        for i in 0..500u64 {
            let a = rect(
                2 * i,
                Vec2::new(rng.range(0.0, 60.0), rng.range(0.0, 60.0)),
                Vec2::new(rng.range(5.0, 40.0), rng.range(5.0, 40.0)),
                rng.range(-3.2, 3.2),
            );
            let b = rect(
                2 * i + 1,
                Vec2::new(rng.range(0.0, 60.0), rng.range(0.0, 60.0)),
                Vec2::new(rng.range(5.0, 40.0), rng.range(5.0, 40.0)),
                rng.range(-3.2, 3.2),
            );
            let overlaps = all_overlaps(&a, &b);
            match Narrowphase::collide(&a, &b) {
                Some(m) => {
                    hits += 1;
                    assert!(overlaps.iter().all(|o| *o >= 0.0));
                    let ca = centroid(&a.vertices());
                    let cb = centroid(&b.vertices());
                    assert!(m.normal.dot(cb - ca) >= 0.0);
                    assert!(!m.points.is_empty());
                    let min = overlaps.iter().copied().fold(f32::INFINITY, f32::min);
                    assert_eq!(m.min_overlap, min);
                }
                None => assert!(overlaps.iter().any(|o| *o < 0.0)),
            }
        }
        assert!(hits > 50, "expected a decent share of overlapping pairs, got {hits}");
    }
}
