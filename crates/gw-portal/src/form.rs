//! Hidden form state extraction.
//!
//! Stateful server-rendered forms (ASP.NET WebForms and friends) only accept
//! a POST that echoes back the hidden inputs issued with the preceding GET:
//! view state blobs, event validation tokens, anti-forgery tokens.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::error::PortalError;

static FORM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("form").expect("static selector"));
static INPUT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input").expect("static selector"));

/// Hidden field name to value mapping extracted from a form page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiddenFormState(BTreeMap<String, String>);

impl HiddenFormState {
    /// Value of a hidden field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Number of hidden fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no hidden field was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Required names that are absent from this state.
    #[must_use]
    pub fn missing<'r>(&self, required: &'r [String]) -> Vec<&'r str> {
        required
            .iter()
            .filter(|name| !self.0.contains_key(name.as_str()))
            .map(String::as_str)
            .collect()
    }
}

impl FromIterator<(String, String)> for HiddenFormState {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Collect every `<input type="hidden">` of a page.
///
/// Duplicate names resolve to the last occurrence. A hidden input without a
/// `value` attribute maps to an empty string.
///
/// # Errors
///
/// Returns [`PortalError::Parse`] if the document contains no `<form>` at
/// all, which is what maintenance and error pages look like.
pub fn extract_hidden_fields(html: &str) -> Result<HiddenFormState, PortalError> {
    let document = Html::parse_document(html);

    if document.select(&FORM).next().is_none() {
        return Err(PortalError::Parse(
            "document contains no form (maintenance or error page?)".to_owned(),
        ));
    }

    let mut fields = BTreeMap::new();
    for input in document.select(&INPUT) {
        let element = input.value();
        let is_hidden = element
            .attr("type")
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("hidden"));
        if !is_hidden {
            continue;
        }
        let Some(name) = element.attr("name").filter(|n| !n.is_empty()) else {
            continue;
        };
        let value = element.attr("value").unwrap_or_default();
        fields.insert(name.to_owned(), value.to_owned());
    }

    Ok(HiddenFormState(fields))
}

/// Whether the page carries an input with the given name.
///
/// Used to recognise the login form when it reappears after a rejected
/// login or an expired session.
pub(crate) fn has_input_named(html: &str, name: &str) -> bool {
    let document = Html::parse_document(html);
    document
        .select(&INPUT)
        .any(|input| input.value().attr("name") == Some(name))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const LOGIN_PAGE: &str = r#"<html><body>
        <form method="post" action="./Default.aspx" id="form1">
            <input type="hidden" name="__VIEWSTATE" id="__VIEWSTATE" value="dDwtMTA4" />
            <input type="hidden" name="__VIEWSTATEGENERATOR" value="CA0B0334" />
            <input type="HIDDEN" name="__EVENTVALIDATION" value="/wEdAAY" />
            <input type="hidden" name="__EVENTTARGET" />
            <input type="text" name="txtusercheck" value="" />
            <input type="password" name="txtpwdcheck" />
            <input type="submit" name="abcd3" value="Login" />
        </form>
    </body></html>"#;

    #[test]
    fn test_extract_hidden_fields() {
        let state = extract_hidden_fields(LOGIN_PAGE).unwrap();
        assert_eq!(state.len(), 4);
        assert_eq!(state.get("__VIEWSTATE"), Some("dDwtMTA4"));
        assert_eq!(state.get("__VIEWSTATEGENERATOR"), Some("CA0B0334"));
        assert_eq!(state.get("__EVENTVALIDATION"), Some("/wEdAAY"));
        assert_eq!(state.get("__EVENTTARGET"), Some(""));
    }

    #[test]
    fn test_visible_inputs_are_skipped() {
        let state = extract_hidden_fields(LOGIN_PAGE).unwrap();
        assert_eq!(state.get("txtusercheck"), None);
        assert_eq!(state.get("abcd3"), None);
    }

    #[test]
    fn test_duplicate_names_last_wins() {
        let html = r#"<form>
            <input type="hidden" name="token" value="first" />
            <input type="hidden" name="token" value="second" />
        </form>"#;
        let state = extract_hidden_fields(html).unwrap();
        assert_eq!(state.get("token"), Some("second"));
    }

    #[test]
    fn test_no_form_is_parse_error() {
        let html = "<html><body><h1>Site under maintenance</h1></body></html>";
        let err = extract_hidden_fields(html).unwrap_err();
        assert!(matches!(err, PortalError::Parse(_)));
    }

    #[test]
    fn test_form_without_hidden_fields_is_empty() {
        let state = extract_hidden_fields("<form><input name=\"q\" /></form>").unwrap();
        assert!(state.is_empty());
    }

    #[test]
    fn test_missing_required_fields() {
        let state = extract_hidden_fields(LOGIN_PAGE).unwrap();
        let required = vec!["__VIEWSTATE".to_owned(), "__RequestVerificationToken".to_owned()];
        assert_eq!(state.missing(&required), vec!["__RequestVerificationToken"]);
    }

    #[test]
    fn test_has_input_named() {
        assert!(has_input_named(LOGIN_PAGE, "txtusercheck"));
        assert!(!has_input_named("<p>Welcome back</p>", "txtusercheck"));
    }
}
