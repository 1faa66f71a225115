//! Installer template substitution.
//!
//! Templates reference values as `%%KEY%%`, where `KEY` is made of uppercase
//! letters, digits and underscores. A `%%` that does not open such a token is
//! copied through unchanged. Values are inserted verbatim and never expanded
//! again.

use std::collections::BTreeMap;

use crate::error::{PackError, Result};

/// Substitution values keyed by placeholder name (without the `%%`).
pub type Substitutions = BTreeMap<String, String>;

/// Fill every `%%KEY%%` token in `template` from `mapping`.
pub fn render(template: &str, mapping: &Substitutions) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("%%") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("%%") {
            Some(end) if is_key(&after[..end]) => {
                let key = &after[..end];
                let value = mapping.get(key).ok_or_else(|| PackError::MissingKey {
                    key: key.to_string(),
                })?;
                out.push_str(value);
                rest = &after[end + 2..];
            }
            _ => {
                out.push_str("%%");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

fn is_key(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
