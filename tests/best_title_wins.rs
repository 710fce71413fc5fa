//! spec.md §8 scenario 1: the highest-scoring title candidate wins, and the
//! winning fnode's note carries the matching source text.

use fathom_core::dom::SimpleDom;
use fathom_core::rule_builder::{dom, max};
use fathom_core::Ruleset;

fn document() -> SimpleDom {
    let mut b = SimpleDom::builder();
    let html = b.leaf("html", None);
    let head = b.leaf("head", Some(html));
    b.element("meta", Some(head), &[("name", "hdl"), ("content", "HDL")]);
    b.element("meta", Some(head), &[("property", "og:title"), ("content", "OpenGraph")]);
    b.element("meta", Some(head), &[("property", "twitter:title"), ("content", "Twitter")]);
    b.element("title", Some(head), &[("text", "Title")]);
    b.build()
}

#[test]
fn highest_scored_title_candidate_wins() {
    let dom = document();

    let ruleset: Ruleset<SimpleDom> = Ruleset::builder()
        .rule(
            dom::<SimpleDom>("meta[property=og:title]")
                .rhs()
                .emit_type("titley")
                .score(40.0)
                .note_fn(|f, _| f.dom().attr(f.element(), "content").map(str::to_string))
                .rule()
                .unwrap(),
        )
        .rule(
            dom::<SimpleDom>("meta[property=twitter:title]")
                .rhs()
                .emit_type("titley")
                .score(30.0)
                .note_fn(|f, _| f.dom().attr(f.element(), "content").map(str::to_string))
                .rule()
                .unwrap(),
        )
        .rule(
            dom::<SimpleDom>("meta[name=hdl]")
                .rhs()
                .emit_type("titley")
                .score(20.0)
                .note_fn(|f, _| f.dom().attr(f.element(), "content").map(str::to_string))
                .rule()
                .unwrap(),
        )
        .rule(
            dom::<SimpleDom>("title")
                .rhs()
                .emit_type("titley")
                .score(10.0)
                .note_fn(|f, _| f.dom().attr(f.element(), "text").map(str::to_string))
                .rule()
                .unwrap(),
        )
        .rule(max::<SimpleDom>("titley").rule_to("best_title"))
        .build();

    let mut bound = ruleset.bind(dom);
    let results = bound.get("best_title").unwrap();

    assert_eq!(results.len(), 1);
    let winner = results[0];
    assert_eq!(bound.score_of(winner, "titley"), 40.0);
    assert_eq!(bound.note_of::<String>(winner, "titley").map(String::as_str), Some("OpenGraph"));
}
