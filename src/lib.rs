//! Deterministic storefront product-page behavior.
//!
//! Loads product-page markup into an in-memory DOM, wires the page's widgets
//! (tooltips, add-to-cart button animation, thumbnail gallery, quantity
//! stepper, and the mobile filter-sidebar toggle) and drives them through
//! synthetic events and a virtual clock, so every behavior, including the
//! 2-second cart-button revert, is testable without a browser.
//!
//! ```
//! use storefront_page::Page;
//!
//! # fn main() -> storefront_page::Result<()> {
//! let mut page = Page::from_html(
//!     r#"
//!     <input id="product-quantity" value="1">
//!     <button id="increase-quantity">+</button>
//!     <button id="decrease-quantity">-</button>
//!     "#,
//! )?;
//! page.click("#increase-quantity")?;
//! page.assert_value("#product-quantity", "2")?;
//! # Ok(())
//! # }
//! ```

use std::error::Error as StdError;
use std::fmt;

mod behavior;
mod dom;
mod html;
mod page;
mod selector;

pub use page::{CartRequest, Page, PendingTimer};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    Dom(String),
    Timer(String),
    SelectorNotFound(String),
    UnsupportedSelector(String),
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::Dom(msg) => write!(f, "dom error: {msg}"),
            Self::Timer(msg) => write!(f, "timer error: {msg}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::TypeMismatch {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {selector}: expected {expected}, actual {actual}"
            ),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}
