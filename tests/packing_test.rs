//! Property-based tests for the packers
//!
//! Every algorithm must return one placement per rectangle, in input order,
//! with no two footprints (grown by the margin) intersecting.

use proptest::prelude::*;
use threemf_merge::{Packer, PackingAlgorithm, Placement, Rect};

/// Rectangles between 1 and 120 mm on a side
fn rects_strategy() -> impl Strategy<Value = Vec<Rect>> {
    prop::collection::vec((1.0f64..120.0, 1.0f64..120.0), 0..40).prop_map(|sizes| {
        sizes
            .into_iter()
            .enumerate()
            .map(|(id, (w, h))| Rect::new(id, w, h))
            .collect()
    })
}

fn algorithm_strategy() -> impl Strategy<Value = PackingAlgorithm> {
    prop_oneof![
        Just(PackingAlgorithm::Shelf),
        Just(PackingAlgorithm::Guillotine),
        Just(PackingAlgorithm::Grid),
    ]
}

fn grown(p: &Placement, margin: f64) -> Placement {
    Placement {
        width: p.width + margin,
        height: p.height + margin,
        ..*p
    }
}

proptest! {
    #[test]
    fn test_placements_never_overlap(
        rects in rects_strategy(),
        margin in 0.0f64..20.0,
        algorithm in algorithm_strategy(),
    ) {
        let placements = Packer::new(margin).with_algorithm(algorithm).pack(&rects);
        prop_assert_eq!(placements.len(), rects.len());

        for (rect, placement) in rects.iter().zip(&placements) {
            prop_assert_eq!(rect.id, placement.id);
            prop_assert_eq!(rect.width, placement.width);
            prop_assert_eq!(rect.height, placement.height);
            prop_assert!(placement.x >= 0.0 && placement.y >= 0.0);
        }

        for (i, a) in placements.iter().enumerate() {
            for b in &placements[i + 1..] {
                prop_assert!(
                    !grown(a, margin).overlaps(&grown(b, margin)),
                    "{:?} and {:?} overlap with margin {}", a, b, margin
                );
            }
        }
    }

    #[test]
    fn test_shelf_rows_fit_the_row_width(
        rects in rects_strategy(),
        row_width in 120.0f64..400.0,
    ) {
        let placements = Packer::new(5.0).with_max_row_width(row_width).pack(&rects);
        for placement in &placements {
            prop_assert!(placement.x + placement.width <= row_width + 1e-9);
        }
    }

    #[test]
    fn test_packing_is_deterministic(
        rects in rects_strategy(),
        algorithm in algorithm_strategy(),
    ) {
        let packer = Packer::new(10.0).with_algorithm(algorithm);
        prop_assert_eq!(packer.pack(&rects), packer.pack(&rects));
    }
}

#[test]
fn test_three_rectangle_shelf() {
    let rects = [
        Rect::new(0, 40.0, 40.0),
        Rect::new(1, 60.0, 30.0),
        Rect::new(2, 20.0, 20.0),
    ];
    let placements = Packer::new(10.0).with_max_row_width(256.0).pack(&rects);

    let xs: Vec<f64> = placements.iter().map(|p| p.x).collect();
    assert_eq!(xs, vec![70.0, 0.0, 120.0]);
    assert!(placements.iter().all(|p| p.y == 0.0));
}

#[test]
fn test_compact_is_tighter_than_default_for_mixed_heights() {
    let rects: Vec<Rect> = (0..12)
        .map(|i| Rect::new(i, 30.0, if i % 3 == 0 { 90.0 } else { 25.0 }))
        .collect();

    let extent = |algorithm| {
        let placements = Packer::new(5.0).with_algorithm(algorithm).pack(&rects);
        let max_x = placements.iter().map(|p| p.x + p.width).fold(0.0, f64::max);
        let max_y = placements.iter().map(|p| p.y + p.height).fold(0.0, f64::max);
        max_x * max_y
    };
    assert!(extent(PackingAlgorithm::Guillotine) <= extent(PackingAlgorithm::Shelf));
}
