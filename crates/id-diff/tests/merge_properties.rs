//! Property tests for the merge-join over arbitrary sorted identifier sets.

use std::collections::BTreeSet;

use id_diff::{compare_identifiers, DiffEvent, DiffOptions, IdValue, MemorySource, Side};
use proptest::prelude::*;

fn run(a: &BTreeSet<i64>, b: &BTreeSet<i64>) -> (Vec<DiffEvent>, id_diff::DiffSummary) {
    let source_a = MemorySource::from_values("a", a.iter().copied());
    let source_b = MemorySource::from_values("b", b.iter().copied());
    let mut events: Vec<DiffEvent> = Vec::new();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let result = runtime
        .block_on(compare_identifiers(
            "prop.ids",
            &source_a,
            &source_b,
            DiffOptions::default(),
            &mut events,
        ))
        .unwrap();
    (events, result.summary)
}

fn only_in(events: &[DiffEvent], wanted: Side) -> Vec<i64> {
    events
        .iter()
        .filter_map(DiffEvent::only_in)
        .filter(|(side, _)| *side == wanted)
        .map(|(_, id)| match id {
            IdValue::Int64(n) => *n,
            other => panic!("unexpected identifier {other:?}"),
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_reports_exactly_the_set_differences(
        a in prop::collection::btree_set(-500i64..500, 1..80),
        b in prop::collection::btree_set(-500i64..500, 1..80),
    ) {
        let (events, summary) = run(&a, &b);

        let expected_a: Vec<i64> = a.difference(&b).copied().collect();
        let expected_b: Vec<i64> = b.difference(&a).copied().collect();
        prop_assert_eq!(only_in(&events, Side::A), expected_a);
        prop_assert_eq!(only_in(&events, Side::B), expected_b);

        prop_assert_eq!(summary.total_compared, a.union(&b).count() as u64);
        prop_assert_eq!(summary.matched, a.intersection(&b).count() as u64);
        prop_assert_eq!(summary.consumed_a, a.len() as u64);
        prop_assert_eq!(summary.consumed_b, b.len() as u64);
    }

    #[test]
    fn prop_only_lines_ascend_across_sides(
        a in prop::collection::btree_set(any::<i64>(), 1..40),
        b in prop::collection::btree_set(any::<i64>(), 1..40),
    ) {
        let (events, _) = run(&a, &b);

        let ids: Vec<i64> = events
            .iter()
            .filter_map(DiffEvent::only_in)
            .map(|(_, id)| match id {
                IdValue::Int64(n) => *n,
                other => panic!("unexpected identifier {other:?}"),
            })
            .collect();
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn prop_swapping_sides_swaps_classification(
        a in prop::collection::btree_set(0i64..200, 1..50),
        b in prop::collection::btree_set(0i64..200, 1..50),
    ) {
        let (_, forward) = run(&a, &b);
        let (_, reversed) = run(&b, &a);

        prop_assert_eq!(forward.only_in_a, reversed.only_in_b);
        prop_assert_eq!(forward.only_in_b, reversed.only_in_a);
        prop_assert_eq!(forward.total_compared, reversed.total_compared);
    }
}
