//! Per-entry expiration policy.

use crate::CacheError;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Expiration policy supplied when an entry is written.
///
/// Absolute and relative expirations combine by taking the earlier deadline.
/// A sliding window is re-armed on every read but never extends past the
/// absolute deadline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryOptions {
    pub absolute_expiration: Option<DateTime<Utc>>,
    pub absolute_expiration_relative_to_now: Option<Duration>,
    pub sliding_expiration: Option<Duration>,
}

impl EntryOptions {
    /// No expiration at all. Used for tag index records.
    pub fn none() -> Self {
        Self::default()
    }

    /// Expire at a fixed point in time.
    pub fn absolute(at: DateTime<Utc>) -> Self {
        Self {
            absolute_expiration: Some(at),
            ..Self::default()
        }
    }

    /// Expire a fixed duration after the write.
    pub fn expires_in(ttl: Duration) -> Self {
        Self {
            absolute_expiration_relative_to_now: Some(ttl),
            ..Self::default()
        }
    }

    /// Expire after `window` without reads.
    pub fn sliding(window: Duration) -> Self {
        Self {
            sliding_expiration: Some(window),
            ..Self::default()
        }
    }

    pub fn with_sliding(mut self, window: Duration) -> Self {
        self.sliding_expiration = Some(window);
        self
    }

    pub fn has_expiration(&self) -> bool {
        self.absolute_expiration.is_some()
            || self.absolute_expiration_relative_to_now.is_some()
            || self.sliding_expiration.is_some()
    }

    /// Resolves the absolute deadline for an entry written at `now`.
    pub fn resolve_absolute(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let relative = self
            .absolute_expiration_relative_to_now
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .and_then(|ttl| now.checked_add_signed(ttl));

        match (self.absolute_expiration, relative) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Rejects combinations that would expire the entry on arrival.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), CacheError> {
        if let Some(at) = self.absolute_expiration
            && at <= now
        {
            return Err(CacheError::InvalidOptions(format!(
                "absolute expiration {} is not in the future",
                at.to_rfc3339()
            )));
        }

        if self.absolute_expiration_relative_to_now == Some(Duration::ZERO) {
            return Err(CacheError::InvalidOptions(
                "relative expiration must be positive".into(),
            ));
        }

        if self.sliding_expiration == Some(Duration::ZERO) {
            return Err(CacheError::InvalidOptions(
                "sliding expiration must be positive".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_none_has_no_expiration() {
        let options = EntryOptions::none();
        assert!(!options.has_expiration());
        assert_eq!(options.resolve_absolute(now()), None);
    }

    #[test]
    fn test_relative_resolves_from_now() {
        let options = EntryOptions::expires_in(Duration::from_secs(300));
        assert_eq!(
            options.resolve_absolute(now()),
            Some(now() + chrono::Duration::minutes(5))
        );
    }

    #[test]
    fn test_earlier_deadline_wins() {
        let options = EntryOptions {
            absolute_expiration: Some(now() + chrono::Duration::minutes(1)),
            absolute_expiration_relative_to_now: Some(Duration::from_secs(600)),
            sliding_expiration: None,
        };
        assert_eq!(
            options.resolve_absolute(now()),
            Some(now() + chrono::Duration::minutes(1))
        );
    }

    #[test]
    fn test_sliding_alone_has_no_absolute_deadline() {
        let options = EntryOptions::sliding(Duration::from_secs(60));
        assert!(options.has_expiration());
        assert_eq!(options.resolve_absolute(now()), None);
    }

    #[test]
    fn test_validate_rejects_past_absolute() {
        let options = EntryOptions::absolute(now() - chrono::Duration::seconds(1));
        assert!(matches!(
            options.validate(now()),
            Err(CacheError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_durations() {
        assert!(EntryOptions::expires_in(Duration::ZERO).validate(now()).is_err());
        assert!(EntryOptions::sliding(Duration::ZERO).validate(now()).is_err());
        assert!(
            EntryOptions::expires_in(Duration::from_secs(1))
                .with_sliding(Duration::from_secs(1))
                .validate(now())
                .is_ok()
        );
    }
}
