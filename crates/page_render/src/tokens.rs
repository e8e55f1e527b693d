//! `{{Field}}` token substitution

use std::sync::OnceLock;

use regex_lite::{Captures, Regex};
use sheet_model::Row;

fn token_regex() -> Option<&'static Regex> {
    static TOKEN: OnceLock<Option<Regex>> = OnceLock::new();
    TOKEN
        .get_or_init(|| Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").ok())
        .as_ref()
}

/// Replace every `{{Field}}` token with the record's value
///
/// Whitespace inside the braces is ignored. Tokens naming a column the
/// record does not have, and all tokens when there is no record, are left
/// exactly as written.
pub fn substitute_tokens(template: &str, record: Option<&Row>) -> String {
    let (Some(regex), Some(record)) = (token_regex(), record) else {
        return template.to_string();
    };

    regex
        .replace_all(template, |caps: &Captures| {
            let field = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            match record.get(field) {
                Some(value) => value.to_string(),
                None => caps.get(0).map(|m| m.as_str()).unwrap_or("").to_string(),
            }
        })
        .into_owned()
}

/// Whether the text contains at least one token
pub fn has_tokens(text: &str) -> bool {
    token_regex().map(|r| r.is_match(text)).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Row {
        Row::from_pairs([("Price", "19.99"), ("Item Name", "Oslo chair"), ("Empty", "")])
    }

    #[test]
    fn test_substitute_price() {
        assert_eq!(substitute_tokens("Price: {{Price}}", Some(&record())), "Price: 19.99");
    }

    #[test]
    fn test_missing_token_passes_through() {
        assert_eq!(substitute_tokens("{{Missing}}", Some(&record())), "{{Missing}}");
        assert_eq!(
            substitute_tokens("{{Price}} / {{ Missing }}", Some(&record())),
            "19.99 / {{ Missing }}"
        );
    }

    #[test]
    fn test_whitespace_and_spaces_in_names() {
        assert_eq!(substitute_tokens("{{ Price }}", Some(&record())), "19.99");
        assert_eq!(substitute_tokens("{{Item Name}}!", Some(&record())), "Oslo chair!");
    }

    #[test]
    fn test_empty_value_and_no_record() {
        assert_eq!(substitute_tokens("[{{Empty}}]", Some(&record())), "[]");
        assert_eq!(substitute_tokens("{{Price}}", None), "{{Price}}");
    }

    #[test]
    fn test_malformed_braces_untouched() {
        assert_eq!(substitute_tokens("{Price} {{Price", Some(&record())), "{Price} {{Price");
        assert_eq!(substitute_tokens("{{}}", Some(&record())), "{{}}");
    }

    #[test]
    fn test_has_tokens() {
        assert!(has_tokens("a {{b}} c"));
        assert!(!has_tokens("plain"));
        assert!(has_tokens("{{ B C }}"));
    }
}
