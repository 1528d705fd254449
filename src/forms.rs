//! Form plumbing shared by every editable page.
//!
//! `FormFields` reads urlencoded bodies and query strings that repeat keys
//! (multi-select checkboxes). `FieldErrors` carries per-field messages back
//! into a re-rendered form.

use std::collections::BTreeMap;
use validator::ValidationErrors;

/// Ordered key/value pairs from an urlencoded body or query string.
#[derive(Clone, Debug, Default)]
pub struct FormFields(Vec<(String, String)>);

impl FormFields {
    pub fn parse(input: &[u8]) -> Self {
        Self(
            url::form_urlencoded::parse(input)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        )
    }

    pub fn from_query(query: &str) -> Self {
        Self::parse(query.as_bytes())
    }

    /// First value for `key`, trimmed.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
    }

    /// First non-empty value for `key`, owned.
    pub fn text(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_owned()
    }

    /// `None` for a missing or blank value.
    pub fn optional_text(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.is_empty()).map(str::to_owned)
    }

    /// All values for `key` that parse as ids. Unparseable values are dropped.
    pub fn ids(&self, key: &str) -> Vec<i32> {
        let mut ids: Vec<i32> = self
            .0
            .iter()
            .filter(|(k, _)| k == key)
            .filter_map(|(_, v)| v.trim().parse().ok())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn id(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Checkbox semantics: present and not "false"/"off".
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), Some(v) if !v.is_empty() && v != "false" && v != "off")
    }

    pub fn csrf_token(&self) -> &str {
        self.get("csrf_token").unwrap_or_default()
    }
}

/// Field name to messages, rendered next to the matching input.
#[derive(Clone, Debug, Default)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// Messages for one field; empty when the field is valid.
    pub fn get(&self, field: &str) -> Vec<String> {
        self.0.get(field).cloned().unwrap_or_default()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every message, prefixed by field, for logs and non-field summaries.
    pub fn all(&self) -> Vec<String> {
        self.0
            .iter()
            .flat_map(|(field, messages)| {
                messages
                    .iter()
                    .map(move |message| format!("{}: {}", field, message))
            })
            .collect()
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, list) in errors.field_errors() {
            for error in list {
                let message = match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value ({}).", error.code),
                };
                out.add(field, message);
            }
        }
        out
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.all().join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 3, message = "Too short."))]
        name: String,
    }

    #[test]
    fn test_repeated_keys_collect_ids() {
        let fields = FormFields::from_query("genres=3&genres=1&genres=x&genres=3&title=+Drums+");
        assert_eq!(fields.ids("genres"), vec![1, 3]);
        assert_eq!(fields.get("title"), Some("Drums"));
        assert_eq!(fields.optional_text("missing"), None);
    }

    #[test]
    fn test_flag_values() {
        let fields = FormFields::from_query("a=on&b=false&c=");
        assert!(fields.flag("a"));
        assert!(!fields.flag("b"));
        assert!(!fields.flag("c"));
        assert!(!fields.flag("d"));
    }

    #[test]
    fn test_validation_messages_are_kept() {
        let errors = Sample {
            name: "ab".to_owned(),
        }
        .validate()
        .unwrap_err();
        let errors = FieldErrors::from(errors);
        assert_eq!(errors.get("name"), vec!["Too short.".to_owned()]);
        assert!(errors.get("other").is_empty());
    }
}
