//! Mapping from a settled die's orientation to the face value it shows.
//!
//! Each entry pairs a printed value with that face's outward normal in the
//! die's local frame. The table order is canonical: when a die rests exactly
//! on an edge or corner (numerically possible at low precision, physically
//! unstable) the earliest entry wins, so resolution is always deterministic.

use rapier3d::prelude as rapier;
use rapier::nalgebra::{UnitQuaternion, Vector3};

/// Face values and their local outward normals, in canonical scan order.
pub const FACE_NORMALS: [(u8, [f32; 3]); 6] = [
    (5, [0.0, 1.0, 0.0]),  // top
    (2, [0.0, -1.0, 0.0]), // bottom
    (3, [1.0, 0.0, 0.0]),  // right
    (4, [-1.0, 0.0, 0.0]), // left
    (6, [0.0, 0.0, 1.0]),  // front
    (1, [0.0, 0.0, -1.0]), // back
];

/// Face whose local normal is most aligned with the given local-frame up
/// vector. First strict maximum wins, so ties fall to table order.
pub fn face_for_up(local_up: &Vector3<f32>) -> u8 {
    let mut best_value = FACE_NORMALS[0].0;
    let mut best_dot = f32::NEG_INFINITY;
    for (value, normal) in FACE_NORMALS {
        let dot = local_up.dot(&Vector3::new(normal[0], normal[1], normal[2]));
        if dot > best_dot {
            best_dot = dot;
            best_value = value;
        }
    }
    best_value
}

/// Resolve the upward face of a die with the given world orientation by
/// rotating world up into the die's local frame.
pub fn resolve_face(rotation: &UnitQuaternion<f32>) -> u8 {
    let local_up = rotation.inverse_transform_vector(&Vector3::y());
    face_for_up(&local_up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn table_covers_every_value_exactly_once() {
        let mut seen = [false; 7];
        for (value, _) in FACE_NORMALS {
            assert!((1..=6).contains(&value));
            assert!(!seen[value as usize], "value {value} appears twice");
            seen[value as usize] = true;
        }
    }

    #[test]
    fn table_normals_are_unit_axes() {
        for (value, normal) in FACE_NORMALS {
            let v = Vector3::new(normal[0], normal[1], normal[2]);
            assert_eq!(v.norm(), 1.0, "normal of face {value} must be unit length");
            assert_eq!(
                v.abs().sum(),
                1.0,
                "normal of face {value} must lie on a coordinate axis"
            );
        }
    }

    #[test]
    fn identity_orientation_shows_five() {
        assert_eq!(resolve_face(&UnitQuaternion::identity()), 5);
    }

    #[test]
    fn quarter_turns_expose_each_side_face() {
        // Rolling the die a quarter turn about Z brings +X (value 3) or
        // -X (value 4) up depending on direction: for q = rot_z(+90deg) the
        // local face now pointing at world up is q^-1 * Y = +X.
        let about_z = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        assert_eq!(resolve_face(&about_z), 3);
        let about_z_neg = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -FRAC_PI_2);
        assert_eq!(resolve_face(&about_z_neg), 4);

        // A quarter turn about X brings a Z face up.
        let about_x = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2);
        assert_eq!(resolve_face(&about_x), 1);
        let about_x_neg = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2);
        assert_eq!(resolve_face(&about_x_neg), 6);
    }

    #[test]
    fn upside_down_shows_two() {
        let flipped = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 2.0 * FRAC_PI_2);
        assert_eq!(resolve_face(&flipped), 2);
    }

    #[test]
    fn edge_tie_resolves_by_table_order() {
        // Up exactly between +Y and +X: both dot products are equal, so the
        // earlier table entry (5, +Y) must win.
        let c = std::f32::consts::FRAC_1_SQRT_2;
        assert_eq!(face_for_up(&Vector3::new(c, c, 0.0)), 5);

        // Corner case: three-way tie, still the first entry.
        let t = 1.0 / 3.0_f32.sqrt();
        assert_eq!(face_for_up(&Vector3::new(t, t, t)), 5);

        // Tie between +X and +Z only: +X (value 3) precedes +Z in the table.
        assert_eq!(face_for_up(&Vector3::new(c, 0.0, c)), 3);
    }

    #[test]
    fn resolution_is_always_a_valid_face() {
        // A fixed sweep of arbitrary orientations, not a statistical claim.
        for i in 0..64 {
            let a = i as f32 * 0.37;
            let q = UnitQuaternion::from_euler_angles(a, a * 1.7, a * 2.3);
            let face = resolve_face(&q);
            assert!((1..=6).contains(&face), "got {face} for sample {i}");
        }
    }
}
