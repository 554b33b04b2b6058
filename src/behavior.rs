//! The product-page widget vocabulary: which anchors get wired at load
//! time, what each handler does when its event arrives, and the quantity
//! arithmetic shared by the stepper controls and the change handler.

/// Elements flagged for tooltip controllers.
pub(crate) const TOOLTIP_TRIGGER_SELECTOR: &str = r#"[data-bs-toggle="tooltip"]"#;
/// Add-to-cart buttons, one listener each.
pub(crate) const ADD_TO_CART_SELECTOR: &str = ".add-to-cart-btn";
/// Gallery anchors.
pub(crate) const MAIN_IMAGE_ID: &str = "main-product-image";
pub(crate) const THUMBNAIL_SELECTOR: &str = ".product-thumbnail";
pub(crate) const ACTIVE_CLASS: &str = "active";
/// Quantity stepper anchors.
pub(crate) const QUANTITY_INPUT_ID: &str = "product-quantity";
pub(crate) const INCREASE_BUTTON_ID: &str = "increase-quantity";
pub(crate) const DECREASE_BUTTON_ID: &str = "decrease-quantity";
/// Filter sidebar anchors.
pub(crate) const FILTER_TOGGLE_ID: &str = "filter-toggle";
pub(crate) const FILTER_SIDEBAR_ID: &str = "filter-sidebar";
pub(crate) const SHOW_FILTER_CLASS: &str = "show-filter";

/// Cart button markup for the two visual states.
pub(crate) const CART_CONFIRMED_HTML: &str = r#"<i class="fas fa-check me-1"></i> Đã thêm"#;
pub(crate) const CART_IDLE_HTML: &str =
    r#"<i class="fas fa-shopping-cart me-1"></i> Thêm vào giỏ hàng"#;
pub(crate) const BTN_PRIMARY_CLASS: &str = "btn-primary";
pub(crate) const BTN_SUCCESS_CLASS: &str = "btn-success";
pub(crate) const CART_REVERT_DELAY_MS: i64 = 2000;

pub(crate) const QUANTITY_MIN: i64 = 1;
pub(crate) const QUANTITY_MAX: i64 = 99;

/// A wired handler. Listeners and timer callbacks carry one of these
/// instead of code; the page interprets them against its own state, so
/// the whole behavior set stays inspectable and `Clone`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Behavior {
    ShowTooltip,
    HideTooltip,
    AddToCart,
    RevertCartButton,
    SelectThumbnail,
    IncrementQuantity,
    DecrementQuantity,
    ClampQuantity,
    ToggleFilterSidebar,
}

/// Integer prefix parse with `parseInt` semantics: leading whitespace is
/// skipped, an optional sign is honored, a `0x`/`0X` prefix switches to
/// hexadecimal, and parsing stops at the first non-digit. `None` when no
/// digits follow the sign and radix prefix.
pub(crate) fn parse_int_prefix(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let bytes = trimmed.as_bytes();
    let mut i = 0usize;
    let mut negative = false;

    match bytes.first() {
        Some(b'-') => {
            negative = true;
            i += 1;
        }
        Some(b'+') => {
            i += 1;
        }
        _ => {}
    }

    let mut radix: i64 = 10;
    if bytes.get(i) == Some(&b'0') && matches!(bytes.get(i + 1), Some(b'x' | b'X')) {
        radix = 16;
        i += 2;
    }

    let digits_start = i;
    let mut value: i64 = 0;
    while i < bytes.len() {
        let digit = match bytes[i] {
            b @ b'0'..=b'9' => i64::from(b - b'0'),
            b @ b'a'..=b'f' if radix == 16 => i64::from(b - b'a' + 10),
            b @ b'A'..=b'F' if radix == 16 => i64::from(b - b'A' + 10),
            _ => break,
        };
        value = value.saturating_mul(radix).saturating_add(digit);
        i += 1;
    }

    if i == digits_start {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// What a committed edit leaves in the quantity field. Unparseable input
/// and anything below the minimum coerce to the minimum, overflow coerces
/// to the maximum, and in-range values are kept as-is (already canonical
/// for anything a stepper produces).
pub(crate) fn normalized_quantity(raw: &str) -> i64 {
    match parse_int_prefix(raw) {
        None => QUANTITY_MIN,
        Some(value) if value < QUANTITY_MIN => QUANTITY_MIN,
        Some(value) if value > QUANTITY_MAX => QUANTITY_MAX,
        Some(value) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_int_prefix_matches_parse_int() {
        assert_eq!(parse_int_prefix("42"), Some(42));
        assert_eq!(parse_int_prefix("  7 "), Some(7));
        assert_eq!(parse_int_prefix("12abc"), Some(12));
        assert_eq!(parse_int_prefix("12.9"), Some(12));
        assert_eq!(parse_int_prefix("-3"), Some(-3));
        assert_eq!(parse_int_prefix("+5"), Some(5));
        assert_eq!(parse_int_prefix(""), None);
        assert_eq!(parse_int_prefix("abc"), None);
        assert_eq!(parse_int_prefix("-"), None);
        assert_eq!(parse_int_prefix(".5"), None);
    }

    #[test]
    fn parse_int_prefix_honors_hex_prefix() {
        assert_eq!(parse_int_prefix("0x10"), Some(16));
        assert_eq!(parse_int_prefix("0X2a"), Some(42));
        assert_eq!(parse_int_prefix("-0x8"), Some(-8));
        assert_eq!(parse_int_prefix("0x10zz"), Some(16));
        // A bare prefix consumes the "0x" without falling back to "0".
        assert_eq!(parse_int_prefix("0x"), None);
        assert_eq!(parse_int_prefix("0xg"), None);
        // Without the prefix, hex letters end the digit run.
        assert_eq!(parse_int_prefix("10f"), Some(10));
    }

    #[test]
    fn parse_int_prefix_saturates_on_huge_input() {
        assert_eq!(parse_int_prefix("99999999999999999999"), Some(i64::MAX));
    }

    #[test]
    fn normalized_quantity_clamps_both_ends() {
        assert_eq!(normalized_quantity(""), 1);
        assert_eq!(normalized_quantity("junk"), 1);
        assert_eq!(normalized_quantity("0"), 1);
        assert_eq!(normalized_quantity("-4"), 1);
        assert_eq!(normalized_quantity("1"), 1);
        assert_eq!(normalized_quantity("50"), 50);
        assert_eq!(normalized_quantity("99"), 99);
        assert_eq!(normalized_quantity("100"), 99);
    }
}
