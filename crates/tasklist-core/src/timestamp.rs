//! Serde helpers for the `created_at` wire field.
//!
//! Values are written as RFC 3339. On input RFC 3339 is preferred, but an
//! ISO-8601 date-time without offset is also accepted and read as UTC since
//! many REST backends echo local timestamps that way.

use serde::{Deserialize, Deserializer, Serializer};
use time::format_description::FormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

const NAIVE_WITH_FRACTION: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
const NAIVE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Parse a timestamp in any of the accepted wire shapes.
///
/// # Errors
/// Returns the RFC 3339 parse error when no accepted shape matches.
pub fn parse(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
    let raw = raw.trim();
    OffsetDateTime::parse(raw, &Rfc3339).or_else(|err| {
        PrimitiveDateTime::parse(raw, NAIVE_WITH_FRACTION)
            .or_else(|_| PrimitiveDateTime::parse(raw, NAIVE))
            .map(PrimitiveDateTime::assume_utc)
            .map_err(|_| err)
    })
}

/// Format a timestamp for the wire.
///
/// # Errors
/// Fails only for years outside the RFC 3339 range.
pub fn format(ts: OffsetDateTime) -> Result<String, time::error::Format> {
    ts.format(&Rfc3339)
}

/// Serialize as RFC 3339.
///
/// # Errors
/// Propagates formatting failures as serializer errors.
pub fn serialize<S>(ts: &OffsetDateTime, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let text = format(*ts).map_err(serde::ser::Error::custom)?;
    s.serialize_str(&text)
}

/// Deserialize from RFC 3339 or an offset-less ISO-8601 date-time.
///
/// # Errors
/// Rejects strings that match none of the accepted shapes.
pub fn deserialize<'de, D>(d: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(d)?;
    parse(&raw).map_err(serde::de::Error::custom)
}
