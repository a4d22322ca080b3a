use crate::base62;
use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::Duration;

/// Identifier assigned to a record when it is created.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    const PREFIX: &'static str = "url_";

    /// Wraps an existing identifier, e.g. one read back from a store.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().to_string())
    }

    /// Renders a raw 64-bit id as `url_<base62>`.
    pub fn from_raw(raw: u64) -> Self {
        Self(format!("{}{}", Self::PREFIX, base62::encode(raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A shortened URL as persisted by a [`RecordStore`](crate::RecordStore).
///
/// The serialized form is the externally visible record shape; the owner is
/// exposed as `user_id` and `custom_alias` is omitted when no alias was
/// requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub id: RecordId,
    /// The original URL that was shortened.
    pub long_url: String,
    pub short_code: ShortCode,
    /// Opaque identifier of the principal that created the record.
    #[serde(rename = "user_id")]
    pub owner_id: String,
    pub created_at: Timestamp,
    /// The record is logically deleted from this instant on.
    pub expires_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_alias: Option<ShortCode>,
}

impl UrlRecord {
    /// Whether the record is dead at `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }

    /// Time left until expiry, or `None` once the record is dead.
    pub fn remaining_lifetime(&self, now: Timestamp) -> Option<Duration> {
        if self.is_expired_at(now) {
            return None;
        }
        Duration::try_from(self.expires_at.duration_since(now)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::SignedDuration;

    fn record(expires_at: Timestamp, custom_alias: Option<ShortCode>) -> UrlRecord {
        UrlRecord {
            id: RecordId::from_raw(42),
            long_url: "https://example.com".to_string(),
            short_code: ShortCode::new_unchecked("abc1234"),
            owner_id: "u1".to_string(),
            created_at: Timestamp::from_second(1_700_000_000).unwrap(),
            expires_at,
            custom_alias,
        }
    }

    #[test]
    fn record_id_from_raw() {
        assert_eq!(RecordId::from_raw(0).as_str(), "url_0");
        assert_eq!(RecordId::from_raw(62).as_str(), "url_10");
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let expires_at = Timestamp::from_second(1_700_086_400).unwrap();
        let rec = record(expires_at, None);

        assert!(!rec.is_expired_at(expires_at - SignedDuration::from_millis(1)));
        assert!(rec.is_expired_at(expires_at));
        assert!(rec.is_expired_at(expires_at + SignedDuration::from_secs(1)));
    }

    #[test]
    fn remaining_lifetime() {
        let expires_at = Timestamp::from_second(1_700_086_400).unwrap();
        let rec = record(expires_at, None);

        let an_hour_before = expires_at - SignedDuration::from_hours(1);
        assert_eq!(
            rec.remaining_lifetime(an_hour_before),
            Some(Duration::from_secs(3600))
        );
        assert_eq!(rec.remaining_lifetime(expires_at), None);
    }

    #[test]
    fn serialized_shape() {
        let expires_at = Timestamp::from_second(1_700_086_400).unwrap();
        let plain = serde_json::to_value(record(expires_at, None)).unwrap();

        assert_eq!(plain["user_id"], "u1");
        assert_eq!(plain["short_code"], "abc1234");
        assert_eq!(plain["id"], "url_g");
        assert!(plain.get("custom_alias").is_none());
        assert!(plain.get("owner_id").is_none());

        let aliased = record(expires_at, Some(ShortCode::new("my-alias").unwrap()));
        let json = serde_json::to_string(&aliased).unwrap();
        let back: UrlRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, aliased);
    }
}
