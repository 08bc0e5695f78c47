//! Emission idempotence
//!
//! Reconciling the emitted text of an instance again, with the same schema
//! and no new signals, must reproduce it byte for byte.

use proptest::prelude::*;
use tmpl_reconcile::PageContext;
use tmpl_test_utils::{journal_schema, reconciler};

const KEYS: &[&str] = &[
    "title", "name", "frequency", "editor", "country", "history", "abbreviation", "ISSN", "foo", "image_file",
];

fn instance_text(pairs: &[(&str, String)]) -> String {
    let mut text = String::from("{{Infobox journal");
    for (key, value) in pairs {
        text.push_str(&format!("\n| {key} = {value}"));
    }
    text.push_str("\n}}");
    text
}

fn reconcile_text(runtime: &tokio::runtime::Runtime, text: &str) -> String {
    let page = PageContext::new("", text);
    runtime
        .block_on(reconciler(journal_schema()).reconcile_page(&page))
        .expect("reconciliation should not fail")
        .text
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn reconciled_text_is_a_fixed_point(
        pairs in prop::collection::vec((prop::sample::select(KEYS), "[A-Za-z0-9 ]{0,12}"), 0..8)
    ) {
        let runtime = tokio::runtime::Runtime::new().expect("runtime");
        let once = reconcile_text(&runtime, &instance_text(&pairs));
        let twice = reconcile_text(&runtime, &once);
        prop_assert_eq!(twice, once);
    }
}
