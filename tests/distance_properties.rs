//! spec.md §8 scenario 3: the tree-position distance metric is reflexive,
//! symmetric, and treats every ancestor/descendant pair as unreachable,
//! checked over randomly generated small trees.

use fathom_core::cluster::{distance, ClusterOpts, MAX_DISTANCE};
use fathom_core::dom::{ElementId, SimpleDom};
use proptest::prelude::*;

/// A small forest: `parents[i]` is the index of node `i`'s parent among
/// `0..i`, or `None` if `i` is a root. Built this way so every generated
/// vector is trivially a valid tree (no cycles, parents always precede
/// children).
fn arb_forest(max_size: usize) -> impl Strategy<Value = Vec<Option<usize>>> {
    (2..=max_size).prop_flat_map(move |size| {
        prop::collection::vec(0..=max_size, size).prop_map(move |raw| {
            raw.iter()
                .enumerate()
                .map(|(i, &pick)| {
                    // `i` possible parents (0..i) plus "no parent"; map the raw
                    // draw onto that range so every index stays a valid forest.
                    if i == 0 {
                        None
                    } else {
                        let choice = pick % (i + 1);
                        if choice == i { None } else { Some(choice) }
                    }
                })
                .collect()
        })
    })
}

fn build_dom(parents: &[Option<usize>]) -> (SimpleDom, Vec<ElementId>) {
    let mut b = SimpleDom::builder();
    let mut ids = Vec::with_capacity(parents.len());
    for (i, &parent) in parents.iter().enumerate() {
        let tag = if i % 2 == 0 { "div" } else { "span" };
        let parent_id = parent.map(|p| ids[p]);
        ids.push(b.leaf(tag, parent_id));
    }
    (b.build(), ids)
}

proptest! {
    #[test]
    fn distance_to_self_is_zero(parents in arb_forest(12)) {
        let (dom, ids) = build_dom(&parents);
        let opts = ClusterOpts::<SimpleDom>::new(10.0);
        for &id in &ids {
            prop_assert_eq!(distance(&dom, id, id, &opts), 0.0);
        }
    }

    #[test]
    fn distance_is_symmetric(parents in arb_forest(12), i in 0usize..12, j in 0usize..12) {
        let (dom, ids) = build_dom(&parents);
        let i = i % ids.len();
        let j = j % ids.len();
        let opts = ClusterOpts::<SimpleDom>::new(10.0);
        prop_assert_eq!(
            distance(&dom, ids[i], ids[j], &opts),
            distance(&dom, ids[j], ids[i], &opts)
        );
    }

    #[test]
    fn ancestor_descendant_pairs_are_unreachable(chain_len in 2usize..10, i in 0usize..10, j in 0usize..10) {
        // A straight chain guarantees every lower index is a proper ancestor
        // of every higher one, so no `prop_assume`-driven rejection is needed.
        let parents: Vec<Option<usize>> = (0..chain_len)
            .map(|i| if i == 0 { None } else { Some(i - 1) })
            .collect();
        let (dom, ids) = build_dom(&parents);
        let i = i % chain_len;
        let j = j % chain_len;
        prop_assume!(i != j);
        let (ancestor, descendant) = if i < j { (i, j) } else { (j, i) };

        let opts = ClusterOpts::<SimpleDom>::new(10.0);
        prop_assert_eq!(distance(&dom, ids[ancestor], ids[descendant], &opts), MAX_DISTANCE);
        prop_assert_eq!(distance(&dom, ids[descendant], ids[ancestor], &opts), MAX_DISTANCE);
    }
}
