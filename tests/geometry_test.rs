//! Property-based tests for transforms and vertex rotation

use proptest::prelude::*;
use threemf_merge::geometry::{bounding_box, rotate_vertices};
use threemf_merge::{Mesh, Transform, Vertex};

fn angle() -> impl Strategy<Value = f64> {
    -360.0f64..360.0
}

fn offset() -> impl Strategy<Value = f64> {
    -1000.0f64..1000.0
}

fn cloud_strategy() -> impl Strategy<Value = Mesh> {
    prop::collection::vec((-50.0f64..50.0, -50.0f64..50.0, -50.0f64..50.0), 1..40).prop_map(
        |points| {
            let mut mesh = Mesh::new();
            mesh.vertices = points
                .into_iter()
                .map(|(x, y, z)| Vertex::new(x, y, z))
                .collect();
            mesh
        },
    )
}

fn distance(a: &Vertex, b: &Vertex) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2) + (a.z - b.z).powi(2)).sqrt()
}

proptest! {
    #[test]
    fn test_transform_string_round_trip(
        rx in angle(), ry in angle(), rz in angle(),
        tx in offset(), ty in offset(), tz in offset(),
    ) {
        let transform = Transform::rotation(rx, ry, rz, tx, ty, tz);
        let parsed: Transform = transform.to_string().parse().unwrap();
        for (a, b) in transform.as_array().iter().zip(parsed.as_array()) {
            prop_assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
        }
        prop_assert_eq!(parsed.to_string(), transform.to_string());
    }

    #[test]
    fn test_translation_keeps_two_decimals(tx in offset(), ty in offset(), tz in offset()) {
        let transform = Transform::translation(tx, ty, tz);
        prop_assert!(transform.is_translation_only());
        let [x, y, z] = transform.offset();
        prop_assert!((x - tx).abs() <= 0.005 + 1e-9);
        prop_assert!((y - ty).abs() <= 0.005 + 1e-9);
        prop_assert!((z - tz).abs() <= 0.005 + 1e-9);
        prop_assert!(!transform.to_string().contains("-0.00"));
    }

    #[test]
    fn test_rotation_block_is_orthonormal(rx in angle(), ry in angle(), rz in angle()) {
        let m = Transform::rotation(rx, ry, rz, 0.0, 0.0, 0.0).rotation_block();
        for i in 0..3 {
            for j in 0..3 {
                let dot: f64 = (0..3).map(|k| m[i][k] * m[j][k]).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                prop_assert!((dot - expected).abs() < 1e-7);
            }
        }
    }

    #[test]
    fn test_rotation_preserves_distances(
        mesh in cloud_strategy(),
        rx in angle(), ry in angle(), rz in angle(),
    ) {
        let mut rotated = mesh.clone();
        let min_z = rotate_vertices(&mut rotated, rx, ry, rz).unwrap();

        let bbox = bounding_box(&rotated).unwrap();
        prop_assert_eq!(min_z, bbox.min_z);

        for i in 0..mesh.vertices.len() {
            for j in i + 1..mesh.vertices.len() {
                let before = distance(&mesh.vertices[i], &mesh.vertices[j]);
                let after = distance(&rotated.vertices[i], &rotated.vertices[j]);
                prop_assert!((before - after).abs() < 1e-6);
            }
        }
    }
}

#[test]
fn test_quarter_turn_about_z() {
    let m = Transform::rotation(0.0, 0.0, 90.0, 0.0, 0.0, 0.0).rotation_block();
    let expected = [[0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
    assert_eq!(m, expected);
}

#[test]
fn test_malformed_transform_strings() {
    for bad in ["", "1 0 0", "1 0 0 0 1 0 0 0 1 0 0 0 0", "1 0 0 0 1 0 0 0 1 a b c"] {
        assert!(bad.parse::<Transform>().is_err(), "accepted '{}'", bad);
    }
}
