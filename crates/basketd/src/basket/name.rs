//! Basket name validation.
//!
//! Names address baskets directly in the public URL space, so they are
//! restricted to a conservative character set and must not collide with
//! the administrative top-level paths.

use crate::error::ServiceError;
use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;

/// Pattern every basket name must match.
pub const NAME_PATTERN: &str = r"^[\w\d\-_\.]{1,250}$";

/// Top-level paths owned by the service itself.
pub const RESERVED_NAMES: &[&str] = &["api", "baskets", "web"];

static NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn name_regex() -> &'static Regex {
    NAME_REGEX.get_or_init(|| {
        RegexBuilder::new(NAME_PATTERN)
            .size_limit(usize::MAX)
            .build()
            .expect("invalid basket name pattern")
    })
}

/// Check a candidate basket name against the naming pattern.
pub fn validate_name(name: &str) -> Result<(), ServiceError> {
    if name_regex().is_match(name) {
        Ok(())
    } else {
        Err(ServiceError::InvalidName {
            pattern: NAME_PATTERN.to_string(),
        })
    }
}

/// True when the name collides with an administrative path.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}
