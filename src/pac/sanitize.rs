//! Shell-metacharacter filtering for values interpolated into command lines.
//!
//! `sanitize` is the pure, total filter. `Sanitizer` applies it under an
//! explicit `SanitizePolicy`: strip (with a warning) or reject outright.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::StudioError;

/// Characters able to break out of a quoted shell argument.
pub const SHELL_METACHARACTERS: &[char] = &[';', '&', '|', '`', '$', '"', '\\'];

fn metachar_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[;&|`$"\\]"#).expect("valid regex"))
}

/// Remove every shell metacharacter from `value`.
///
/// Clean input is returned unchanged, so `sanitize(sanitize(s)) == sanitize(s)`.
pub fn sanitize(value: &str) -> String {
    metachar_re().replace_all(value, "").into_owned()
}

/// True if `value` contains at least one shell metacharacter.
pub fn contains_metacharacters(value: &str) -> bool {
    metachar_re().is_match(value)
}

/// What to do with a value that contains shell metacharacters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SanitizePolicy {
    /// Strip the characters and log a warning naming the field.
    #[default]
    Strip,
    /// Fail with `StudioError::InvalidInput`.
    Reject,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sanitizer {
    policy: SanitizePolicy,
}

impl Sanitizer {
    pub fn new(policy: SanitizePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> SanitizePolicy {
        self.policy
    }

    /// Clean a caller-supplied value for the named field.
    ///
    /// A value that ends up empty is rejected under either policy.
    pub fn clean(&self, field: &str, value: &str) -> crate::Result<String> {
        if !contains_metacharacters(value) {
            return non_empty(field, value.to_string());
        }

        match self.policy {
            SanitizePolicy::Reject => Err(StudioError::InvalidInput(
                field.to_string(),
                format!(
                    "contains one of the disallowed characters {}",
                    SHELL_METACHARACTERS.iter().collect::<String>()
                ),
            )),
            SanitizePolicy::Strip => {
                let cleaned = sanitize(value);
                tracing::warn!(
                    field = %field,
                    removed = value.chars().count() - cleaned.chars().count(),
                    "stripped shell metacharacters from input"
                );
                non_empty(field, cleaned)
            }
        }
    }
}

fn non_empty(field: &str, value: String) -> crate::Result<String> {
    if value.trim().is_empty() {
        return Err(StudioError::InvalidInput(
            field.to_string(),
            "must not be empty".to_string(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_every_metacharacter() {
        let dirty = r#"a;b&c|d`e$f"g\h"#;
        let clean = sanitize(dirty);
        assert_eq!(clean, "abcdefgh");
        for c in SHELL_METACHARACTERS {
            assert!(!clean.contains(*c), "sanitized output still contains {:?}", c);
        }
    }

    #[test]
    fn test_sanitize_identity_on_clean_input() {
        for clean in [
            "",
            "MySolution",
            "https://contoso.crm.dynamics.com",
            "/tmp/out dir/solution.zip",
            "Ünïcödé name (v2) #1 'quoted'",
        ] {
            assert_eq!(sanitize(clean), clean);
        }
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = sanitize("Evil;rm -rf / && echo $HOME");
        assert_eq!(sanitize(&once), once);
        assert_eq!(once, "Evilrm -rf /  echo HOME");
    }

    #[test]
    fn test_contains_metacharacters() {
        assert!(contains_metacharacters("a|b"));
        assert!(contains_metacharacters("back\\slash"));
        assert!(!contains_metacharacters("plain-name_01"));
    }

    #[test]
    fn test_strip_policy_strips() {
        let sanitizer = Sanitizer::new(SanitizePolicy::Strip);
        assert_eq!(
            sanitizer.clean("name", "Evil;rm -rf /").unwrap(),
            "Evilrm -rf /"
        );
    }

    #[test]
    fn test_reject_policy_rejects() {
        let sanitizer = Sanitizer::new(SanitizePolicy::Reject);
        let result = sanitizer.clean("name", "Sales & Marketing");
        assert!(
            matches!(result, Err(StudioError::InvalidInput(ref field, _)) if field == "name"),
            "reject policy must refuse metacharacters: {:?}",
            result
        );
        assert_eq!(sanitizer.clean("name", "Sales").unwrap(), "Sales");
    }

    #[test]
    fn test_value_empty_after_strip_is_rejected() {
        let sanitizer = Sanitizer::default();
        assert_eq!(sanitizer.policy(), SanitizePolicy::Strip);
        assert!(matches!(
            sanitizer.clean("path", ";;$"),
            Err(StudioError::InvalidInput(_, _))
        ));
        assert!(matches!(
            sanitizer.clean("path", "   "),
            Err(StudioError::InvalidInput(_, _))
        ));
    }
}
