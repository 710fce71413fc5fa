//! spec.md §8 scenario 4: the `BestCluster` LHS, driven end-to-end through
//! the executor, picks out the larger of two link clusters rather than the
//! single link stranded deep behind "stride" elements.

use fathom_core::cluster::ClusterOpts;
use fathom_core::dom::SimpleDom;
use fathom_core::rule_builder::{best_cluster, dom};
use fathom_core::Ruleset;

#[test]
fn best_cluster_picks_the_larger_adjacent_group_over_a_distant_outlier() {
    let mut b = SimpleDom::builder();
    let body = b.leaf("body", None);
    let div_a = b.leaf("div", Some(body));
    let div_b = b.leaf("div", Some(body));
    for _ in 0..3 {
        b.leaf("a", Some(div_a));
    }
    for _ in 0..3 {
        b.leaf("a", Some(div_b));
    }

    let stride1 = b.leaf("div", Some(body));
    let stride2 = b.leaf("div", Some(stride1));
    let stride3 = b.leaf("div", Some(stride2));
    b.leaf("a", Some(stride3));

    let dom = b.build();

    let opts = ClusterOpts::<SimpleDom>::new(10.0);

    let ruleset: Ruleset<SimpleDom> = Ruleset::builder()
        .rule(dom::<SimpleDom>("a").rhs().emit_type("link").score(1.0).rule().unwrap())
        .rule(best_cluster::<SimpleDom>("link", opts).rule_to("link_cluster"))
        .build();

    let mut bound = ruleset.bind(dom);
    let results = bound.get("link_cluster").unwrap();

    assert_eq!(results.len(), 6, "the six adjacent anchors form the winning cluster");
}
