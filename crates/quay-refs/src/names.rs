//! Branch name validation.
//!
//! Branch names double as relative paths under `refs/heads/`, so the rules
//! keep them unambiguous and safe to place on a filesystem:
//! - non-empty, with no whitespace or any of `~ ^ : ? * [ \`
//! - no `..` and no `@{`
//! - no leading or trailing `.` or `/`, and no `.lock` suffix
//! - every `/`-separated component non-empty and not starting with `.`

use crate::error::{RefError, Result};

const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

/// A whole-name rule: returns a rejection reason when the name breaks it.
type Rule = fn(&str) -> Option<String>;

const RULES: &[Rule] = &[
    |name| name.is_empty().then(|| "branch name must not be empty".into()),
    |name| {
        name.chars()
            .find(|c| FORBIDDEN_CHARS.contains(c))
            .map(|c| format!("contains forbidden character: {c:?}"))
    },
    |name| name.contains("..").then(|| "must not contain '..'".into()),
    |name| name.contains("@{").then(|| "must not contain '@{'".into()),
    |name| {
        (name.starts_with('.') || name.ends_with('.'))
            .then(|| "must not start or end with '.'".into())
    },
    |name| {
        (name.starts_with('/') || name.ends_with('/'))
            .then(|| "must not start or end with '/'".into())
    },
    |name| name.ends_with(".lock").then(|| "must not end with '.lock'".into()),
    |name| {
        name.split('/').find_map(|component| {
            if component.is_empty() {
                Some("path components must not be empty".into())
            } else if component.starts_with('.') {
                Some(format!("component must not start with '.': {component:?}"))
            } else {
                None
            }
        })
    },
];

/// Validate a short branch name, returning `Ok(())` if valid.
///
/// ```
/// use quay_refs::names::validate_branch_name;
///
/// assert!(validate_branch_name("main").is_ok());
/// assert!(validate_branch_name("feature/auth").is_ok());
/// assert!(validate_branch_name("").is_err());
/// assert!(validate_branch_name("bad..name").is_err());
/// ```
pub fn validate_branch_name(name: &str) -> Result<()> {
    match RULES.iter().find_map(|rule| rule(name)) {
        Some(reason) => Err(RefError::InvalidBranchName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
