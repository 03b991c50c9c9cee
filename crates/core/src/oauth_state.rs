//! OAuth `state` token handling for the authorization-code flow.
//!
//! The state ties a redirect back to the identity that initiated it:
//! `{identity}-{unix_millis}`. Because identities may themselves contain
//! the separator (`org-42-user-7`), the identity is always recovered by
//! splitting at the **last** `-`. Callers must replicate this exactly.

use crate::error::CoreError;
use crate::types::Timestamp;

/// Separator between the identity and the timestamp suffix.
const STATE_SEPARATOR: char = '-';

/// Reject states whose timestamp is older than this, in seconds.
pub const STATE_MAX_AGE_SECS: i64 = 600;

/// Build a state token for `identity` at time `now`.
pub fn mint_state(identity: &str, now: Timestamp) -> String {
    format!("{identity}{STATE_SEPARATOR}{}", now.timestamp_millis())
}

/// Split a state token into `(identity, unix_millis)`.
///
/// Right-anchored: `"a-b-c-999"` resolves to identity `"a-b-c"`, never
/// `"a"`.
pub fn split_state(state: &str) -> Result<(&str, i64), CoreError> {
    let (identity, suffix) = state
        .rsplit_once(STATE_SEPARATOR)
        .ok_or_else(|| CoreError::Validation(format!("Malformed OAuth state: '{state}'")))?;
    if identity.is_empty() {
        return Err(CoreError::Validation(format!(
            "OAuth state has empty identity: '{state}'"
        )));
    }
    let millis: i64 = suffix.parse().map_err(|_| {
        CoreError::Validation(format!("OAuth state has non-numeric suffix: '{state}'"))
    })?;
    Ok((identity, millis))
}

/// Validate that `state` belongs to `expected_identity` and is fresh.
///
/// The timestamp suffix is allowed to differ between mint and callback;
/// only the identity portion must match, modulo the suffix.
pub fn validate_state(
    state: &str,
    expected_identity: &str,
    now: Timestamp,
) -> Result<(), CoreError> {
    let (identity, millis) = split_state(state)?;
    if identity != expected_identity {
        return Err(CoreError::Unauthorized(
            "OAuth state does not match the requesting identity".to_string(),
        ));
    }
    let age_secs = (now.timestamp_millis() - millis) / 1000;
    if age_secs > STATE_MAX_AGE_SECS {
        return Err(CoreError::Unauthorized(
            "OAuth state has expired".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    fn at(secs: i64) -> Timestamp {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_split_is_right_anchored() {
        // Identity "a-b-c" with suffix "999" must not resolve to "a".
        let (identity, millis) = split_state("a-b-c-999").unwrap();
        assert_eq!(identity, "a-b-c");
        assert_eq!(millis, 999);
    }

    #[test]
    fn test_mint_then_split() {
        let now = at(1_700_000_000);
        let state = mint_state("org-42-user-7", now);
        let (identity, millis) = split_state(&state).unwrap();
        assert_eq!(identity, "org-42-user-7");
        assert_eq!(millis, now.timestamp_millis());
    }

    #[test]
    fn test_malformed_states() {
        assert_matches!(split_state("nosuffix"), Err(CoreError::Validation(_)));
        assert_matches!(split_state("user-abc"), Err(CoreError::Validation(_)));
        assert_matches!(split_state("-999"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn test_validate_identity_mismatch() {
        let now = at(1_700_000_000);
        let state = mint_state("user-1", now);
        assert_matches!(
            validate_state(&state, "user-2", now),
            Err(CoreError::Unauthorized(_))
        );
    }

    #[test]
    fn test_validate_expired_state() {
        let minted = at(1_700_000_000);
        let state = mint_state("user-1", minted);
        let later = at(1_700_000_000 + STATE_MAX_AGE_SECS + 1);
        assert_matches!(
            validate_state(&state, "user-1", later),
            Err(CoreError::Unauthorized(_))
        );
    }

    #[test]
    fn test_validate_fresh_state() {
        let now = at(1_700_000_000);
        let state = mint_state("user-1", now);
        assert!(validate_state(&state, "user-1", at(1_700_000_030)).is_ok());
    }
}
