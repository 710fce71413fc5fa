//! spec.md §8 scenario 5: a ruleset with mutually dependent rules is
//! constructed successfully; the cycle only surfaces once a query actually
//! reaches it.

use fathom_core::dom::SimpleDom;
use fathom_core::error::EngineError;
use fathom_core::rule_builder::{max, of_type};
use fathom_core::Ruleset;

#[test]
fn mutually_dependent_rules_build_fine_but_fail_at_query_time() {
    let ruleset: Ruleset<SimpleDom> = Ruleset::builder()
        .rule(of_type::<SimpleDom>("a").rhs().emit_type("b").score(1.0).rule().unwrap())
        .rule(of_type::<SimpleDom>("b").rhs().emit_type("a").score(1.0).rule().unwrap())
        .rule(max::<SimpleDom>("a").rule_to("out_a"))
        .rule(max::<SimpleDom>("b").rule_to("out_b"))
        .build();

    let mut bound = ruleset.bind(SimpleDom::builder().build());

    let result_a = bound.get("out_a");
    assert!(matches!(result_a, Err(EngineError::Cycle { .. })));

    let mut bound2 = ruleset.bind(SimpleDom::builder().build());
    let result_b = bound2.get("out_b");
    assert!(matches!(result_b, Err(EngineError::Cycle { .. })));
}
