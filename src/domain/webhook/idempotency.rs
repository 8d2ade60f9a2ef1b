//! Idempotency keys for membership API writes.
//!
//! A key derived from the external reference is identical for every
//! redelivery of the same logical event, so the membership API can drop
//! duplicates. Without a reference the key falls back to
//! `<unix-millis>-<random>`, which is unique per attempt and therefore gives
//! no deduplication across retries. That fallback is a known limitation.

use std::fmt;

/// Value sent in the `Idempotency-Key` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyKey {
    value: String,
    derived: bool,
}

impl IdempotencyKey {
    /// Build the key for an optional external reference.
    pub fn for_reference(external_reference: Option<&str>) -> Self {
        match external_reference.map(str::trim).filter(|r| !r.is_empty()) {
            Some(reference) => Self {
                value: reference.to_string(),
                derived: true,
            },
            None => Self {
                value: format!(
                    "{}-{}",
                    chrono::Utc::now().timestamp_millis(),
                    uuid::Uuid::new_v4().simple()
                ),
                derived: false,
            },
        }
    }

    /// False when the key is the random fallback.
    pub fn is_derived(&self) -> bool {
        self.derived
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn key_equals_reference() {
        let key = IdempotencyKey::for_reference(Some("sub_1"));
        assert_eq!(key.as_str(), "sub_1");
        assert!(key.is_derived());
    }

    #[test]
    fn fallback_key_is_unique_per_call() {
        let a = IdempotencyKey::for_reference(None);
        let b = IdempotencyKey::for_reference(None);

        assert!(!a.is_derived());
        assert_ne!(a, b);
        let (millis, random) = a.as_str().split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(random.len(), 32);
    }

    #[test]
    fn blank_reference_uses_fallback() {
        assert!(!IdempotencyKey::for_reference(Some("  ")).is_derived());
    }

    proptest! {
        #[test]
        fn key_is_deterministic_for_reference(reference in "[a-zA-Z0-9_]{1,40}") {
            let first = IdempotencyKey::for_reference(Some(&reference));
            let second = IdempotencyKey::for_reference(Some(&reference));
            prop_assert_eq!(first.as_str(), reference.as_str());
            prop_assert_eq!(first, second);
        }
    }
}
