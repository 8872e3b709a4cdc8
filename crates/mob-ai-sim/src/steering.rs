//! Flat-plane steering helpers shared by goals, behaviors and the movement
//! system. Positions are `(x, y, z)`; only X and Z are steered.

use rand::Rng;

pub type Vec3 = (f32, f32, f32);

/// Distance at which a destination counts as reached.
pub const ARRIVAL_RADIUS: f32 = 0.5;

/// Horizontal distance between two points.
pub fn distance_xz(a: Vec3, b: Vec3) -> f32 {
    let dx = b.0 - a.0;
    let dz = b.2 - a.2;
    (dx * dx + dz * dz).sqrt()
}

/// Yaw in degrees that faces from `from` toward `to`.
///
/// 0 faces +Z, 90 faces -X, 180 faces -Z, 270 faces +X.
pub fn yaw_toward(from: Vec3, to: Vec3) -> f32 {
    let dx = to.0 - from.0;
    let dz = to.2 - from.2;
    let yaw = (-dx).atan2(dz).to_degrees();
    if yaw < 0.0 {
        yaw + 360.0
    } else {
        yaw
    }
}

/// Pitch in degrees that looks from `from` toward `to`. Negative looks up.
pub fn pitch_toward(from: Vec3, to: Vec3) -> f32 {
    let horizontal = distance_xz(from, to);
    let dy = to.1 - from.1;
    (-dy).atan2(horizontal).to_degrees()
}

/// Horizontal velocity of magnitude `speed` from `from` toward `to`.
/// Returns zero when already within [`ARRIVAL_RADIUS`].
pub fn velocity_toward(from: Vec3, to: Vec3, speed: f32) -> (f32, f32) {
    let dist = distance_xz(from, to);
    if dist < ARRIVAL_RADIUS {
        return (0.0, 0.0);
    }
    let step = speed.min(dist);
    ((to.0 - from.0) / dist * step, (to.2 - from.2) / dist * step)
}

/// Uniform random point within `radius` blocks of `origin` on the same Y.
pub fn random_point_near(origin: Vec3, radius: f32, rng: &mut impl Rng) -> Vec3 {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let dist = rng.gen_range(radius * 0.25..=radius);
    (
        origin.0 + angle.cos() * dist,
        origin.1,
        origin.2 + angle.sin() * dist,
    )
}

/// Point `distance` blocks away from `threat`, continuing the line from
/// `threat` through `origin`.
pub fn flee_point(origin: Vec3, threat: Vec3, distance: f32) -> Vec3 {
    let dist = distance_xz(threat, origin);
    if dist < f32::EPSILON {
        return (origin.0 + distance, origin.1, origin.2);
    }
    (
        origin.0 + (origin.0 - threat.0) / dist * distance,
        origin.1,
        origin.2 + (origin.2 - threat.2) / dist * distance,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn velocity_points_at_destination() {
        let (vx, vz) = velocity_toward((0.0, 4.0, 0.0), (0.0, 4.0, 10.0), 0.25);
        assert!(vx.abs() < 0.001);
        assert!((vz - 0.25).abs() < 0.001);

        let (vx, vz) = velocity_toward((0.0, 4.0, 0.0), (3.0, 4.0, 4.0), 0.5);
        assert!(((vx * vx + vz * vz).sqrt() - 0.5).abs() < 0.001);
    }

    #[test]
    fn velocity_never_overshoots() {
        let (vx, vz) = velocity_toward((0.0, 4.0, 0.0), (0.8, 4.0, 0.0), 2.0);
        assert!((vx - 0.8).abs() < 0.001);
        assert!(vz.abs() < 0.001);
        assert_eq!(velocity_toward((5.0, 4.0, 5.0), (5.2, 4.0, 5.0), 1.0), (0.0, 0.0));
    }

    #[test]
    fn yaw_quadrants() {
        let o = (0.0, 0.0, 0.0);
        assert!(yaw_toward(o, (0.0, 0.0, 10.0)).abs() < 0.1);
        assert!((yaw_toward(o, (-10.0, 0.0, 0.0)) - 90.0).abs() < 0.1);
        assert!((yaw_toward(o, (0.0, 0.0, -10.0)) - 180.0).abs() < 0.1);
        assert!((yaw_toward(o, (10.0, 0.0, 0.0)) - 270.0).abs() < 0.1);
    }

    #[test]
    fn pitch_looks_up_at_higher_targets() {
        assert!(pitch_toward((0.0, 4.0, 0.0), (4.0, 8.0, 0.0)) < 0.0);
        assert!(pitch_toward((0.0, 4.0, 0.0), (4.0, 4.0, 0.0)).abs() < 0.001);
    }

    #[test]
    fn random_points_stay_in_radius() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let p = random_point_near((10.0, 4.0, -5.0), 8.0, &mut rng);
            assert!(distance_xz((10.0, 4.0, -5.0), p) <= 8.0 + 0.001);
            assert_eq!(p.1, 4.0);
        }
    }

    #[test]
    fn flee_moves_away_from_threat() {
        let p = flee_point((2.0, 4.0, 0.0), (0.0, 4.0, 0.0), 6.0);
        assert!((p.0 - 8.0).abs() < 0.001);
        let p = flee_point((0.0, 4.0, 0.0), (0.0, 4.0, 0.0), 6.0);
        assert!((distance_xz((0.0, 4.0, 0.0), p) - 6.0).abs() < 0.001);
    }
}
