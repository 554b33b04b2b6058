use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::{FileFailurePersistence, TestCaseResult};
use storefront_page::{Page, Result};

const QUANTITY_PROPTEST_REGRESSION_FILE: &str =
    "tests/proptest-regressions/quantity_property_fuzz_test.txt";
const DEFAULT_QUANTITY_PROPTEST_CASES: u32 = 128;

const STEPPER_PAGE_HTML: &str = r#"
<button id="decrease-quantity">-</button>
<input id="product-quantity" value="1">
<button id="increase-quantity">+</button>
"#;

#[derive(Clone, Debug)]
enum QuantityAction {
    EditText(String),
    ClickIncrease,
    ClickDecrease,
}

fn quantity_proptest_cases() -> u32 {
    std::env::var("STOREFRONT_PAGE_PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_QUANTITY_PROPTEST_CASES)
}

fn raw_input_strategy() -> BoxedStrategy<String> {
    vec(
        prop_oneof![
            Just('0'),
            Just('1'),
            Just('2'),
            Just('5'),
            Just('9'),
            Just('-'),
            Just('+'),
            Just('.'),
            Just(' '),
            Just('a'),
            Just('q'),
            Just('č'),
        ],
        0..=8,
    )
    .prop_map(|chars| chars.into_iter().collect())
    .boxed()
}

fn quantity_action_strategy() -> BoxedStrategy<QuantityAction> {
    prop_oneof![
        3 => raw_input_strategy().prop_map(QuantityAction::EditText),
        2 => Just(QuantityAction::ClickIncrease),
        2 => Just(QuantityAction::ClickDecrease),
    ]
    .boxed()
}

fn run_action(page: &mut Page, action: &QuantityAction) -> Result<()> {
    match action {
        QuantityAction::EditText(raw) => page.edit_text("#product-quantity", raw),
        QuantityAction::ClickIncrease => page.click("#increase-quantity"),
        QuantityAction::ClickDecrease => page.click("#decrease-quantity"),
    }
}

fn committed_value(page: &Page) -> TestCaseResult {
    let raw = page
        .value("#product-quantity")
        .map_err(|err| proptest::test_runner::TestCaseError::fail(format!("{err:?}")))?;
    let parsed: i64 = raw.parse().map_err(|_| {
        proptest::test_runner::TestCaseError::fail(format!(
            "committed quantity is not a bare integer: {raw:?}"
        ))
    })?;
    prop_assert!(
        (1..=99).contains(&parsed),
        "committed quantity out of range: {parsed}"
    );
    Ok(())
}

fn assert_quantity_stays_bounded(actions: &[QuantityAction]) -> TestCaseResult {
    let mut page = Page::from_html(STEPPER_PAGE_HTML)
        .map_err(|err| proptest::test_runner::TestCaseError::fail(format!("{err:?}")))?;

    for (step, action) in actions.iter().enumerate() {
        if let Err(error) = run_action(&mut page, action) {
            prop_assert!(
                false,
                "action returned error at step {step}: {action:?}, error={error:?}"
            );
        }
        // Every action in this page either commits an edit (clamped by the
        // change handler) or steps from a committed value, so the field
        // must always hold an in-range integer afterwards.
        committed_value(&page)?;
    }

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: quantity_proptest_cases(),
        failure_persistence: Some(Box::new(
            FileFailurePersistence::Direct(QUANTITY_PROPTEST_REGRESSION_FILE),
        )),
        .. ProptestConfig::default()
    })]

    #[test]
    fn committed_quantities_always_land_in_range(actions in vec(quantity_action_strategy(), 1..=24)) {
        assert_quantity_stays_bounded(&actions)?;
    }

    #[test]
    fn a_single_committed_edit_normalizes_any_input(raw in raw_input_strategy()) {
        let mut page = Page::from_html(STEPPER_PAGE_HTML)
            .map_err(|err| proptest::test_runner::TestCaseError::fail(format!("{err:?}")))?;
        page.edit_text("#product-quantity", &raw)
            .map_err(|err| proptest::test_runner::TestCaseError::fail(format!("{err:?}")))?;
        committed_value(&page)?;
    }
}
