//! End-to-end runs against the mock adapter
//!
//! Each test drives a full `TabularWorkflowRunner` over in-memory rows and
//! checks the resulting `RunSummary`.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tabflow::prelude::*;
use tabflow::{ErrorKind, MockFault};

const LOGIN: &str = r##"
version: "1.0"
name: "login"
fields:
  - { name: "Email", required: true }
  - { name: "Password", required: true }
selectors:
  email: "#Email"
  password: "#Password"
  submit: '//button[normalize-space()="Log in"]'
  account: "a.ico-account"
steps:
  - { action: navigate, url: "/login" }
  - { action: fill, target: email, value: "${Email}" }
  - { action: fill, target: password, value: "${Password}" }
  - { action: click, target: submit }
  - { action: wait_for, target: account }
"##;

const CART: &str = r##"
version: "1.0"
name: "cart"
fields:
  - { name: "name" }
  - { name: "sku", required: true }
  - { name: "price" }
  - { name: "qty" }
selectors:
  search: "#small-searchterms"
  go: "button.search-box-button"
  product: "xpath=//h2[@class='product-title']/a"
  quantity: "input.qty-input"
  add: "#add-to-cart-button"
  unit_price: "td.unit-price"
  line_sku: "td.sku"
steps:
  - { action: navigate, url: "/" }
  - { action: fill, target: search, value: "${name}" }
  - { action: click, target: go }
  - { action: click, target: product }
  - { action: fill, target: quantity, value: "${qty}" }
  - { action: click, target: add }
  - { action: navigate, url: "/cart" }
  - { action: assert_text, target: line_sku, expected: "${sku}" }
  - { action: assert_text, target: unit_price, expected: "${price}" }
"##;

fn login_page() -> MockAdapter {
    MockAdapter::new()
        .with_element("#Email", MockElement::new())
        .with_element("#Password", MockElement::new())
        .with_element(
            "//button[normalize-space()=\"Log in\"]",
            MockElement::new().with_text("Log in"),
        )
        .with_element("a.ico-account", MockElement::new().with_text("My account"))
}

fn users(n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| {
            Row::new(i)
                .with("Email", format!("user{i}@shop.test"))
                .with("Password", "Secret123")
        })
        .collect()
}

fn runner(yaml: &str) -> TabularWorkflowRunner {
    TabularWorkflowRunner::new(
        WorkflowDefinition::from_yaml(yaml).unwrap(),
        RunnerConfig::default(),
    )
}

#[tokio::test]
async fn test_complete_rows_all_pass() {
    let mut adapter = login_page();
    let summary = runner(LOGIN)
        .run_rows(&mut adapter, users(3), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!((summary.passed, summary.failed, summary.skipped), (3, 0, 0));
    assert!(summary.results.iter().all(|r| r.attempts == 1));
    assert!(summary.is_success());
}

#[tokio::test]
async fn test_skipped_row_touches_no_ui() {
    let mut baseline = login_page();
    runner(LOGIN)
        .run_rows(&mut baseline, users(1), &CancellationToken::new())
        .await
        .unwrap();

    let mut rows = users(2);
    rows[1] = Row::new(1).with("Email", "  ").with("Password", "pw");
    let mut adapter = login_page();
    let summary = runner(LOGIN)
        .run_rows(&mut adapter, rows, &CancellationToken::new())
        .await
        .unwrap();

    let skipped = summary.result(1).unwrap();
    assert_eq!(skipped.status, RowStatus::Skipped);
    assert_eq!(skipped.attempts, 0);
    assert_eq!(
        skipped.error.as_ref().unwrap().kind,
        ErrorKind::RequiredFieldMissing
    );
    assert_eq!(adapter.call_count(), baseline.call_count());
}

#[tokio::test]
async fn test_failing_row_is_isolated() {
    let mut adapter = login_page().fail_on_value("user1@shop.test", MockFault::NotFound);
    let summary = runner(LOGIN)
        .run_rows(&mut adapter, users(5), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.total(), 5);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.passed, 4);
    let failed = summary.failures();
    assert_eq!(failed[0].row_index, 1);
    let error = failed[0].error.as_ref().unwrap();
    assert_eq!(error.kind, ErrorKind::ElementNotFound);
    assert_eq!(error.step, Some(1));
    assert!(!summary.is_success());
}

#[tokio::test]
async fn test_cancel_after_second_row() {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);

    let mut runner = runner(LOGIN).on_row(move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) + 1 == 2 {
            trigger.cancel();
        }
    });
    let mut adapter = login_page();
    let summary = runner
        .run_rows(&mut adapter, users(5), &cancel)
        .await
        .unwrap();

    assert_eq!(seen.load(Ordering::SeqCst), 2);
    assert_eq!(summary.status, RunStatus::Aborted);
    assert_eq!(summary.total(), 2);
    assert!(summary.result(2).is_none());
    assert!(!adapter.history().iter().any(|c| c.contains("user2@")));
    assert_eq!(runner.state(), RunnerState::Aborted);
}

#[tokio::test]
async fn test_cart_scenario_pass_and_skip() {
    let rows = vec![
        Row::new(0)
            .with("name", "Widget A")
            .with("sku", "W-100")
            .with("price", "$10.00")
            .with("qty", 2_i64),
        Row::new(1)
            .with("name", "Widget B")
            .with("sku", "")
            .with("price", "$5.00")
            .with("qty", 1_i64),
    ];
    let mut adapter = MockAdapter::new()
        .with_element("#small-searchterms", MockElement::new())
        .with_element("button.search-box-button", MockElement::new())
        .with_element(
            "xpath=//h2[@class='product-title']/a",
            MockElement::new().with_text("Widget A"),
        )
        .with_element("input.qty-input", MockElement::new().with_value("1"))
        .with_element("#add-to-cart-button", MockElement::new())
        .with_element("td.sku", MockElement::new().with_text("W-100"))
        .with_element("td.unit-price", MockElement::new().with_text(" $10.00 "));

    let summary = runner(CART)
        .run_rows(&mut adapter, rows, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.result(0).unwrap().status, RowStatus::Passed);
    let skipped = summary.result(1).unwrap();
    assert_eq!(skipped.status, RowStatus::Skipped);
    let error = skipped.error.as_ref().unwrap();
    assert_eq!(error.kind, ErrorKind::RequiredFieldMissing);
    assert!(error.message.contains("sku"));
    assert_eq!(adapter.element("input.qty-input").unwrap().value, "2");
}

#[tokio::test]
async fn test_price_mismatch_is_reported() {
    let rows = vec![Row::new(0)
        .with("name", "Widget A")
        .with("sku", "W-100")
        .with("price", "$10.00")
        .with("qty", 1_i64)];
    let mut adapter = MockAdapter::new()
        .with_element("#small-searchterms", MockElement::new())
        .with_element("button.search-box-button", MockElement::new())
        .with_element("xpath=//h2[@class='product-title']/a", MockElement::new())
        .with_element("input.qty-input", MockElement::new())
        .with_element("#add-to-cart-button", MockElement::new())
        .with_element("td.sku", MockElement::new().with_text("W-100"))
        .with_element("td.unit-price", MockElement::new().with_text("$12.00"));

    let summary = runner(CART)
        .run_rows(&mut adapter, rows, &CancellationToken::new())
        .await
        .unwrap();

    let result = summary.result(0).unwrap();
    assert_eq!(result.status, RowStatus::Failed);
    assert_eq!(result.mismatches.len(), 1);
    assert_eq!(result.mismatches[0].field, "price");
    assert_eq!(result.mismatches[0].expected, "$10.00");
    assert_eq!(result.mismatches[0].actual, "$12.00");
    assert_eq!(
        result.error.as_ref().unwrap().kind,
        ErrorKind::AssertionMismatch
    );
}

#[tokio::test]
async fn test_run_loads_from_memory_source() {
    let source = MemorySource::new("testData.xlsx")
        .with_sheet("Products", Vec::new())
        .with_sheet("Users", users(2));
    let mut adapter = login_page();
    let mut runner = runner(LOGIN);

    let summary = runner
        .run(
            &mut adapter,
            &source,
            Path::new("testData.xlsx"),
            &SheetId::Name("Users".to_string()),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(summary.passed, 2);
    assert_eq!(runner.state(), RunnerState::Completed);
}

#[tokio::test]
async fn test_missing_workbook_aborts_before_ui() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.xlsx");
    let mut adapter = login_page();
    let mut runner = runner(LOGIN);

    let err = runner
        .run(
            &mut adapter,
            &XlsxSource::new(),
            &path,
            &SheetId::Index(0),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SourceNotFound);
    assert_eq!(runner.state(), RunnerState::Aborted);
    assert_eq!(adapter.call_count(), 0);
}

#[tokio::test]
async fn test_unknown_sheet_lists_available() {
    let source = MemorySource::new("data.xlsx").with_sheet("Users", users(1));
    let mut adapter = login_page();

    let err = runner(LOGIN)
        .run(
            &mut adapter,
            &source,
            Path::new("data.xlsx"),
            &SheetId::Name("Orders".to_string()),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SheetNotFound);
    assert!(err.to_string().contains("Users"));
}

#[tokio::test]
async fn test_no_complete_rows_is_empty_data() {
    let rows = vec![Row::new(0).with("Email", "a@shop.test")];
    let mut adapter = login_page();

    let err = runner(LOGIN)
        .run_rows(&mut adapter, rows, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EmptyData);
    assert_eq!(adapter.call_count(), 0);
}

#[tokio::test]
async fn test_row_scoped_selector_on_empty_optional_field_is_skipped() {
    let yaml = r##"
version: "1.0"
name: "coupon"
fields:
  - { name: "sku", required: true }
  - { name: "coupon" }
selectors:
  cart: "#cart"
  applied: "xpath=//span[@class='applied-discount-code'][contains(., '${coupon}')]"
steps:
  - { action: wait_for, target: cart }
  - { action: wait_for, target: applied }
"##;
    let rows = vec![
        Row::new(0).with("sku", "W-100").with("coupon", "DISCOUNT10"),
        Row::new(1).with("sku", "W-200"),
    ];
    let mut adapter = MockAdapter::new()
        .with_element("#cart", MockElement::new())
        .with_element(
            "xpath=//span[@class='applied-discount-code'][contains(., 'DISCOUNT10')]",
            MockElement::new(),
        );

    let summary = runner(yaml)
        .run_rows(&mut adapter, rows, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.passed, 2);
    let waits = adapter
        .history()
        .iter()
        .filter(|c| c.starts_with("wait_for:xpath="))
        .count();
    assert_eq!(waits, 1);
}
