use plotkit_core::{Path, Point};
use plotkit_optimizer::{merge_path, reorder_paths, PathStage, RandomizeStartStage};
use proptest::prelude::*;

fn point() -> impl Strategy<Value = Point> {
    (-100.0f64..100.0, -100.0f64..100.0).prop_map(|(x, y)| Point::new(x, y))
}

fn path() -> impl Strategy<Value = Path> {
    prop::collection::vec(point(), 2..30)
}

proptest! {
    #[test]
    fn prop_merge_keeps_anchors_and_spacing(path in path(), d in 0.1f64..20.0) {
        let out = merge_path(&path, d);
        prop_assert!(out.len() >= 2);
        prop_assert_eq!(out[0], path[0]);
        let last = *path.last().unwrap();
        prop_assert!(*out.last().unwrap() == last || *out.last().unwrap() == path[0]);
        // interior gaps respect the merge distance; the final gap may be short
        for pair in out[..out.len() - 1].windows(2) {
            prop_assert!(pair[0].distance(&pair[1]) >= d);
        }
    }

    #[test]
    fn prop_reorder_visits_every_path_once(paths in prop::collection::vec(path(), 0..40)) {
        let ordered = reorder_paths(paths.clone(), Point::default());
        prop_assert_eq!(ordered.len(), paths.len());
        let mut used = vec![false; paths.len()];
        for out in &ordered {
            let mut reversed = out.clone();
            reversed.reverse();
            let found = paths
                .iter()
                .enumerate()
                .position(|(i, p)| !used[i] && (p == out || *p == reversed));
            prop_assert!(found.is_some());
            if let Some(i) = found {
                used[i] = true;
            }
        }
    }

    #[test]
    fn prop_randomize_only_touches_closed_loops(
        open in path(),
        ring in prop::collection::vec(point(), 3..20),
        seed in any::<u64>(),
    ) {
        prop_assume!(open[0].distance(open.last().unwrap()) >= 0.01);
        let mut closed = ring.clone();
        closed.push(ring[0]);

        let stage = RandomizeStartStage::seeded(0.01, seed);
        let out = stage.apply(vec![open.clone(), closed.clone()]);
        prop_assert_eq!(&out[0], &open);
        prop_assert_eq!(out[1].len(), closed.len());
        prop_assert_eq!(out[1].first(), out[1].last());
        let start = out[1][0];
        prop_assert!(ring.contains(&start));
    }
}
