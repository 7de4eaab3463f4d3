//! Persisted entities and their create/update payloads

mod bootcamp;
mod course;

pub use bootcamp::{
    slugify, Bootcamp, BootcampPatch, BootcampSummary, Location, NewBootcamp, CAREERS,
    DEFAULT_PHOTO,
};
pub use course::{Course, CoursePatch, NewCourse, SkillLevel};

use crate::error::{Error, Result};

/// Fresh record key
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Accumulates field constraint violations so a client sees all of them at once
#[derive(Debug, Default)]
pub(crate) struct Violations(Vec<String>);

impl Violations {
    pub(crate) fn check(&mut self, ok: bool, message: impl Into<String>) {
        if !ok {
            self.0.push(message.into());
        }
    }

    pub(crate) fn into_result(self) -> Result<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(Error::BadRequest(self.0.join(", ")))
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Timestamps are stored as fixed-precision RFC 3339 strings so that
/// lexical order in the store matches chronological order.
pub(crate) mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_is_simple_uuid() {
        let id = new_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_id());
    }

    #[test]
    fn test_violations_join_messages() {
        let mut violations = Violations::default();
        violations.check(false, "Please add a name");
        violations.check(true, "never shown");
        violations.check(false, "Please add an address");

        match violations.into_result() {
            Err(Error::BadRequest(msg)) => {
                assert_eq!(msg, "Please add a name, Please add an address")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_timestamp_precision_is_fixed() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Stamp {
            #[serde(with = "timestamp")]
            at: chrono::DateTime<chrono::Utc>,
        }

        let at = chrono::DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let json = serde_json::to_value(Stamp { at }).unwrap();
        assert_eq!(json["at"], "2024-05-01T10:00:00.000Z");

        let back: Stamp = serde_json::from_value(json).unwrap();
        assert_eq!(back.at, at);
    }
}
