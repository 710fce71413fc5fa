//! spec.md §8 scenario 2: two independent signals (class name, href pattern)
//! both redirect their fact onto the same page-level fnode; their scores
//! compound multiplicatively rather than replacing one another.

use fathom_core::dom::SimpleDom;
use fathom_core::rule_builder::{dom, of_type};
use fathom_core::Ruleset;

#[test]
fn class_and_href_signals_compound_onto_the_page_fnode() {
    let mut b = SimpleDom::builder();
    let body = b.leaf("body", None);
    let page = b.leaf("div", Some(body));
    let anchor = b.element(
        "a",
        Some(body),
        &[("href", "/authentication/signout/"), ("class", "signout")],
    );
    let dom = b.build();

    let ruleset: Ruleset<SimpleDom> = Ruleset::builder()
        .rule(
            dom::<SimpleDom>("a")
                .rhs()
                .redirect_fn(move |_f, _| Some(page))
                .emit_type("loggedIn")
                .score_fn(move |f, _| {
                    if f.dom().classes(f.element()).iter().any(|c| c == "signout") {
                        2.0
                    } else {
                        1.0
                    }
                })
                .rule()
                .unwrap(),
        )
        .rule(
            dom::<SimpleDom>("a")
                .rhs()
                .redirect_fn(move |_f, _| Some(page))
                .emit_type("loggedIn")
                .score_fn(move |f, _| {
                    let href = f.dom().attr(f.element(), "href").unwrap_or("");
                    if href.contains("signout") {
                        2.0
                    } else {
                        1.0
                    }
                })
                .rule()
                .unwrap(),
        )
        .rule(of_type::<SimpleDom>("loggedIn").rule_to("logged_in"))
        .build();

    let mut bound = ruleset.bind(dom);
    let results = bound.get("logged_in").unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(bound.element_of(results[0]), page);
    assert!(bound.score_of(results[0], "loggedIn") > 1.0);
    let _ = anchor;
}
