//! Hidden-field form scraping for the SSO pages.
//!
//! The identity provider hands state between steps through `<input>` fields
//! of a named form. Forms are located by `id` or `name` and flattened into an
//! ordered key/value list that can be posted back unchanged.

use std::sync::LazyLock;

use regex::Regex;

use super::error::AuthFailure;
use crate::util::{compile_static_regex, parse_attributes};

static FORM_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?is)<form\b([^>]*)>(.*?)</form\s*>"));

// Quoted attribute values may contain `>`.
static INPUT_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?is)<input\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#));

/// Field whose value tells whether the identity provider accepted a login.
pub const RETRY_FIELD: &str = "reTry";

/// Ordered field list of one HTML form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiddenForm {
    fields: Vec<(String, String)>,
}

impl HiddenForm {
    /// Finds the form whose `id` or `name` equals `form_id` and collects its
    /// inputs. Inputs without `name` fall back to `id`; inputs with neither
    /// are skipped. Missing `value` becomes an empty string.
    #[must_use]
    pub fn parse(html: &str, form_id: &str) -> Option<Self> {
        let body = FORM_RE.captures_iter(html).find_map(|caps| {
            let attrs = parse_attributes(caps.get(1).map_or("", |m| m.as_str()));
            let matches = attrs.get("id").is_some_and(|v| v == form_id)
                || attrs.get("name").is_some_and(|v| v == form_id);
            matches.then(|| caps.get(2).map_or("", |m| m.as_str()))
        })?;

        let fields = INPUT_RE
            .captures_iter(body)
            .filter_map(|caps| {
                let mut attrs = parse_attributes(caps.get(1).map_or("", |m| m.as_str()));
                let key = attrs.remove("name").or_else(|| attrs.remove("id"))?;
                let value = attrs.remove("value").unwrap_or_default();
                Some((key, value))
            })
            .collect();
        Some(Self { fields })
    }

    /// Value of the first field named `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Replaces the value of `key`, appending the field when absent.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(name, _)| name == key) {
            slot.1 = value;
        } else {
            self.fields.push((key.to_string(), value));
        }
    }

    /// Fields in document order, ready for `RequestBuilder::form`.
    #[must_use]
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Number of collected fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the form had no usable inputs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Verdict of an identity-provider result form.
    ///
    /// The provider signals failure by a `reTry` field whose value is not
    /// `N` (compared case-insensitively), with `resultCode` and
    /// `resultMessage` describing why. `None` when the form has no `reTry`
    /// field at all.
    #[must_use]
    pub fn verdict(&self) -> Option<Result<(), AuthFailure>> {
        let retry = self.get(RETRY_FIELD)?;
        if retry.trim().eq_ignore_ascii_case("n") {
            return Some(Ok(()));
        }
        Some(Err(AuthFailure::new(
            self.get("resultCode").unwrap_or("-"),
            self.get("resultMessage").unwrap_or_default(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <form id="other"><input name="x" value="1"></form>
        <form name="form-send" method="post" action="/next">
            <input type="hidden" name="ssoToken" value="tok&amp;en">
            <input type='hidden' id="agentId" value='311'/>
            <input type="hidden" name="empty">
            <input type="submit">
        </form>
        </body></html>
    "#;

    #[test]
    fn test_parse_collects_named_inputs_in_order() {
        let form = HiddenForm::parse(PAGE, "form-send").unwrap();
        assert_eq!(
            form.fields(),
            &[
                ("ssoToken".to_string(), "tok&en".to_string()),
                ("agentId".to_string(), "311".to_string()),
                ("empty".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_parse_missing_form_is_none() {
        assert!(HiddenForm::parse(PAGE, "login_form").is_none());
    }

    #[test]
    fn test_set_replaces_or_appends() {
        let mut form = HiddenForm::parse(PAGE, "form-send").unwrap();
        form.set("agentId", "2");
        form.set("pseudonym_session[password]", "pw");
        assert_eq!(form.get("agentId"), Some("2"));
        assert_eq!(form.get("pseudonym_session[password]"), Some("pw"));
        assert_eq!(form.len(), 4);
    }

    #[test]
    fn test_rejection_detected_when_retry_not_n() {
        let html = r#"<form id="form-send">
            <input id="reTry" value="Y">
            <input name="resultCode" value="E102">
            <input name="resultMessage" value="비밀번호가 일치하지 않습니다">
        </form>"#;
        let verdict = HiddenForm::parse(html, "form-send").unwrap().verdict();
        let failure = verdict.unwrap().unwrap_err();
        assert_eq!(failure.code, "E102");
        assert_eq!(failure.message, "비밀번호가 일치하지 않습니다");
    }

    #[test]
    fn test_quoted_angle_bracket_keeps_whole_value() {
        let html = r#"<form id="form-send">
            <input id="reTry" value="Y">
            <input id="resultMessage" value="5회 이상 실패 -> 계정 잠김" type='hidden'>
        </form>"#;
        let failure = HiddenForm::parse(html, "form-send").unwrap().verdict().unwrap().unwrap_err();
        assert_eq!(failure.message, "5회 이상 실패 -> 계정 잠김");
        assert_eq!(failure.code, "-");
    }

    #[test]
    fn test_accepted_when_retry_is_n_any_case() {
        let html = r#"<form id="form-send"><input name="reTry" value="n"></form>"#;
        assert_eq!(HiddenForm::parse(html, "form-send").unwrap().verdict(), Some(Ok(())));
    }

    #[test]
    fn test_no_verdict_without_retry_field() {
        let form = HiddenForm::parse(PAGE, "form-send").unwrap();
        assert!(form.verdict().is_none());
    }
}
