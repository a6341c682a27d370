//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Renders blank sheet cells as a dash.
///
/// Usage in templates: `{{ customer.phone|or_dash }}`
#[askama::filter_fn]
pub fn or_dash(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let text = value.to_string();
    Ok(if text.trim().is_empty() {
        "-".to_string()
    } else {
        text
    })
}

#[cfg(test)]
mod tests {
    use askama::Template;

    use crate::filters;

    #[derive(Template)]
    #[template(source = "{{ value|or_dash }}", ext = "txt")]
    struct Cell<'a> {
        value: &'a str,
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(Cell { value: "  " }.render().ok().as_deref(), Some("-"));
        assert_eq!(Cell { value: "98765" }.render().ok().as_deref(), Some("98765"));
    }
}
