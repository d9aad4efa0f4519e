//! Common types used across the warehouse

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when converting raw values into domain identifiers
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("storeroom id {0} is out of range (1-5)")]
    StoreroomOutOfRange(u8),
}

/// One of the fixed physical stock locations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct StoreroomId(u8);

impl StoreroomId {
    /// Number of storerooms a warehouse has
    pub const COUNT: u8 = 5;

    /// Storeroom used for initial stock and edit-time adjustments
    pub const MAIN: StoreroomId = StoreroomId(1);

    pub fn new(id: u8) -> Result<Self, IdError> {
        if (1..=Self::COUNT).contains(&id) {
            Ok(Self(id))
        } else {
            Err(IdError::StoreroomOutOfRange(id))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// All storerooms in ascending order
    pub fn all() -> impl Iterator<Item = StoreroomId> {
        (1..=Self::COUNT).map(StoreroomId)
    }
}

impl Default for StoreroomId {
    fn default() -> Self {
        Self::MAIN
    }
}

impl TryFrom<u8> for StoreroomId {
    type Error = IdError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StoreroomId> for u8 {
    fn from(id: StoreroomId) -> Self {
        id.0
    }
}

impl std::fmt::Display for StoreroomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Catalog identity of a product, assigned from a monotonically increasing counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u32);

impl ProductId {
    /// Zero-padded search code shown next to the product name
    pub fn code(self) -> String {
        format!("{:05}", self.0)
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Date range for report queries (both ends inclusive)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// The `days` days before `end` plus `end` itself
    pub fn trailing(end: NaiveDate, days: u32) -> Self {
        Self {
            start: end - Duration::days(i64::from(days)),
            end,
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && day <= self.end
    }

    /// Iterate every day in the range, oldest first
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// Timestamps that tolerate the zone-less `datetime-local` strings found in older records.
///
/// Serialization always emits RFC 3339 in UTC with millisecond precision.
pub mod flexible_time {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];

    /// Parse RFC 3339 first, then naive date-times (read as UTC), then bare dates
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        if let Some(naive) = NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        {
            return Some(Utc.from_utc_datetime(&naive));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive))
    }

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            ts: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => serializer.serialize_some(&super::format(ts)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}"))),
                None => Ok(None),
            }
        }
    }
}

/// The calendar day (UTC) a timestamp falls on
pub fn day_of(ts: &DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storeroom_range() {
        assert!(StoreroomId::new(0).is_err());
        assert!(StoreroomId::new(1).is_ok());
        assert!(StoreroomId::new(5).is_ok());
        assert_eq!(StoreroomId::new(6), Err(IdError::StoreroomOutOfRange(6)));
        assert_eq!(StoreroomId::all().count(), 5);
    }

    #[test]
    fn test_storeroom_map_keys_round_trip() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(StoreroomId::new(2).unwrap(), 7i64);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"2":7}"#);
        let back: std::collections::BTreeMap<StoreroomId, i64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_product_code_padding() {
        assert_eq!(ProductId(7).code(), "00007");
        assert_eq!(ProductId(123456).code(), "123456");
    }

    #[test]
    fn test_flexible_time_formats() {
        let rfc = flexible_time::parse("2024-05-01T09:30:00.000Z").unwrap();
        let local = flexible_time::parse("2024-05-01T09:30").unwrap();
        assert_eq!(rfc, local);
        assert!(flexible_time::parse("2024-05-01").is_some());
        assert!(flexible_time::parse("yesterday").is_none());
    }

    #[test]
    fn test_trailing_range_includes_both_ends() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let range = DateRange::trailing(end, 7);
        assert_eq!(range.days().count(), 8);
        assert!(range.contains(NaiveDate::from_ymd_opt(2024, 3, 3).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()));
    }
}
