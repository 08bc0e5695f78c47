//! End-to-end page reconciliation
//!
//! Each scenario runs real page text through the whole pipeline: schema
//! fetch, parsing, seeding, inference against the fixture category graph,
//! preference settling, emission and splicing.

use pretty_assertions::assert_eq;
use tmpl_decision::{HandoffSlot, Severity};
use tmpl_reconcile::{PageContext, ParseError, ReconcileConfig, ReconcileError, ReconciledPage};
use tmpl_test_utils::{journal_schema, minimal_schema, reconciler};

async fn run(schema: tmpl_schema::Schema, page: &PageContext) -> ReconciledPage {
    reconciler(schema)
        .reconcile_page(page)
        .await
        .expect("reconciliation should not fail for fixture pages")
}

/// A brand-new instance is filled from the page title, the suggested
/// autovalue and the categories.
#[tokio::test]
async fn new_instance_gets_title_and_inferred_frequency() {
    let page = PageContext::new("Journal of Tests", "{{Infobox journal}}").with_categories(["Quarterly journals"]);
    let result = run(minimal_schema(), &page).await;

    assert_eq!(
        result.text,
        "{{Infobox journal\n| title          = Journal of Tests\n| frequency      = Quarterly\n}}"
    );
    let choice = &result.snapshot.templates[0];
    assert!(!choice.get("frequency").expect("frequency decided").prefer_original);
    assert_eq!(result.summary.to_string(), "Infobox journal: added title, frequency.");
    assert!(result.changed);
}

/// Reconciling already-emitted text with the same signals changes nothing.
#[tokio::test]
async fn emitted_text_is_a_fixed_point() {
    let page = PageContext::new("Journal of Tests", "{{Infobox journal}}").with_categories(["Quarterly journals"]);
    let first = run(minimal_schema(), &page).await;

    let again = PageContext::new("Journal of Tests", first.text.clone()).with_categories(["Quarterly journals"]);
    let second = run(minimal_schema(), &again).await;

    assert_eq!(second.text, first.text);
    assert!(!second.changed);
    assert!(second.summary.is_empty());
}

/// Written values, aliases, duplicates, unknown keys, sub-templates and
/// categories all meet in one instance.
#[tokio::test]
async fn full_journal_page() {
    let text = "{{Infobox journal\n\
                | name = Journal of Tests\n\
                | history = 1950-present\n\
                | frequency = \n\
                | foo = bar\n\
                | title = Dup\n\
                }}\n\
                {{ISSN|0001-0001}}\n\
                {{Official website|example.org}}";
    let page = PageContext::new("Journal of Tests (journal)", text).with_categories([
        "Elsevier academic journals",
        "Chemistry journals",
        "English-language journals",
        "Monthly journals",
        "Publications established in 1951",
    ]);
    let result = run(journal_schema(), &page).await;

    let expected = "{{Infobox journal\n\
                    | name           = Journal of Tests\n\
                    | abbreviation   = <!-- ISO 4 -->\n\
                    | discipline     = [[Chemistry]]\n\
                    | language       = English\n\
                    | publisher      = [[Elsevier]]\n\
                    | frequency      = Monthly\n\
                    | history        = 1950–present\n\
                    | website        = https://example.org\n\
                    | ISSN           = 0001-0001\n\
                    | foo            = bar\n\
                    }}\n\
                    {{ISSN|0001-0001}}\n\
                    {{Official website|example.org}}";
    assert_eq!(result.text, expected);

    let choice = &result.snapshot.templates[0];
    let title = choice.get("title").expect("title decided");
    assert_eq!(title.display_key(), "name");
    assert_eq!(title.diagnostics[0].severity, Severity::Warning);
    assert!(title.diagnostics[0].message.contains("Dup"));

    let history = choice.get("history").expect("history decided");
    assert!(history.diagnostics[0].message.contains("1951–present"));

    let foo = choice.get("foo").expect("foo kept");
    assert_eq!(foo.diagnostics[0].severity, Severity::Notice);

    assert_eq!(result.summary.changed(), vec!["frequency", "history"]);
    assert!(result.summary.added().contains(&"ISSN"));
    assert!(result.summary.removed().is_empty());
}

/// Several record templates on one page: a page warning, and each instance
/// is reconciled and renamed to the canonical name.
#[tokio::test]
async fn multiple_instances_are_all_reconciled() {
    let page = PageContext::new("A", "{{Infobox journal|title=A}}\n\n{{Infobox magazine|title=B}}");
    let result = run(minimal_schema(), &page).await;

    assert_eq!(result.snapshot.templates.len(), 2);
    let warnings: Vec<_> = result
        .snapshot
        .diagnostics
        .iter()
        .filter(|d| d.is_warning())
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("Found 2 instances"));
    assert_eq!(
        result.text,
        "{{Infobox journal\n| title          = A\n| frequency      = Quarterly\n}}\n\n\
         {{Infobox journal\n| title          = B\n| frequency      = Quarterly\n}}"
    );
}

/// Frequency categories overwrite rather than accumulate.
#[tokio::test]
async fn last_frequency_category_wins() {
    let page = PageContext::new("X", "{{Infobox journal|title=X}}")
        .with_categories(["Biweekly journals", "Monthly journals"]);
    let result = run(minimal_schema(), &page).await;
    let frequency = result.snapshot.templates[0].get("frequency").expect("frequency decided");
    assert_eq!(frequency.chosen_value(), Some("Monthly"));
}

/// The snapshot parked for the next page survives encoding and is read once.
#[tokio::test]
async fn snapshot_handoff_round_trips() {
    let page = PageContext::new("Journal of Tests", "{{Infobox journal|name=Journal of Tests|frequency=}}")
        .with_categories(["Monthly journals"]);
    let slot = HandoffSlot::new();
    let result = reconciler(journal_schema())
        .reconcile_into(&page, &slot)
        .await
        .expect("reconciliation should succeed");

    let restored = slot.take_snapshot().expect("snapshot should be pending");
    assert_eq!(restored, result.snapshot);
    for (before, after) in result.snapshot.templates.iter().zip(&restored.templates) {
        assert_eq!(before.emit("Infobox journal"), after.emit("Infobox journal"));
    }
    assert!(!slot.is_pending());
}

/// Configuration loaded from TOML drives template names, width and fields.
#[tokio::test]
async fn toml_configuration_is_honoured() {
    let config: ReconcileConfig = toml::from_str(
        r#"
        template_names = ["Infobox magazine"]
        canonical_template_name = "Infobox magazine"
        key_column_width = 6
        "#,
    )
    .expect("valid TOML configuration");
    let schema = tmpl_schema::Schema::new(
        "Infobox magazine",
        [tmpl_schema::ParameterDefinition::new("title")],
        ["title"],
    )
    .expect("valid schema");

    let reconciler = tmpl_test_utils::reconciler_with(
        config,
        std::sync::Arc::new(tmpl_reconcile::StaticSchemaSource::new().with_schema(schema)),
        std::sync::Arc::new(tmpl_test_utils::journal_graph()),
        std::sync::Arc::new(tmpl_test_utils::journal_pages()),
    );
    let page = PageContext::new("Weekly Thing", "{{infobox magazine|title=Weekly Thing}} {{Infobox journal|title=Y}}");
    let result = reconciler.reconcile_page(&page).await.expect("reconciliation should succeed");

    assert_eq!(
        result.text,
        "{{Infobox magazine\n| title  = Weekly Thing\n}} {{Infobox journal|title=Y}}"
    );
}

/// Pathologically nested text is refused with an error instead of
/// exhausting the stack.
#[tokio::test]
async fn deeply_nested_text_is_refused() {
    let text = "{{a|".repeat(50_000) + &"}}".repeat(50_000);
    let page = PageContext::new("X", format!("{{{{Infobox journal|title={text}}}}}"));
    let err = reconciler(journal_schema())
        .reconcile_page(&page)
        .await
        .expect_err("nesting beyond the parser limit must be reported");
    assert!(matches!(err, ReconcileError::Parse(ParseError::TooDeep { .. })));
}
