//! MySQL column value to JSON value encoding.
//!
//! Every MySQL type maps to exactly one textual or numeric JSON form, so the
//! same stored value always produces the same bytes:
//!
//! | MySQL                              | JSON                                  |
//! |------------------------------------|---------------------------------------|
//! | integer types, `BOOLEAN`, `YEAR`   | number                                |
//! | `FLOAT`                            | number, shortest `f32` representation |
//! | `DOUBLE`                           | number                                |
//! | `DECIMAL`                          | string, exact server text             |
//! | `DATE`                             | `"YYYY-MM-DD"`                        |
//! | `DATETIME`                         | `"YYYY-MM-DDTHH:MM:SS[.ffffff]"`      |
//! | `TIMESTAMP`                        | `"YYYY-MM-DDTHH:MM:SS[.ffffff]Z"`     |
//! | `TIME`                             | `"[-]HH:MM:SS[.ffffff]"`              |
//! | `BIT`                              | number                                |
//! | `JSON`                             | the embedded JSON value               |
//! | character types, `ENUM`, `SET`     | string                                |
//! | binary types, `GEOMETRY`           | `"base64:<standard base64>"`          |
//!
//! SQL `NULL` and zero dates (`0000-00-00`) become `null`.

use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;
use sqlx::mysql::MySqlRow;
use sqlx::{Row, TypeInfo, ValueRef};

/// Prefix marking base64-encoded binary data.
pub const BINARY_PREFIX: &str = "base64:";

/// JSON encoding family of a MySQL column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Signed integers, including `TINYINT(1)` reported as `BOOLEAN`
    Integer,
    /// Integer types with the `UNSIGNED` attribute
    UnsignedInteger,
    /// Single precision float
    Float,
    /// Double precision float
    Double,
    /// Fixed-point decimal
    Decimal,
    /// `DATE`
    Date,
    /// `DATETIME`
    DateTime,
    /// `TIMESTAMP`
    Timestamp,
    /// `TIME`, which may be negative or exceed 24 hours
    Time,
    /// `YEAR`
    Year,
    /// `BIT(n)`
    Bit,
    /// Native `JSON`
    Json,
    /// Character data
    Text,
    /// Byte data
    Binary,
    /// The `NULL` column type of literal `NULL` expressions
    Null,
    /// Anything the driver reports that is not listed above
    Other,
}

/// Maps the driver's type name (e.g. `"INT UNSIGNED"`, `"VARCHAR"`) to its
/// encoding family.
///
/// # Example
/// ```rust
/// use dbexport_core::adapters::mysql::{ValueKind, classify_mysql_type};
///
/// assert_eq!(classify_mysql_type("BIGINT UNSIGNED"), ValueKind::UnsignedInteger);
/// assert_eq!(classify_mysql_type("DATETIME"), ValueKind::DateTime);
/// ```
pub fn classify_mysql_type(type_name: &str) -> ValueKind {
    let upper = type_name.trim().to_ascii_uppercase();
    let (base, unsigned) = match upper.strip_suffix(" UNSIGNED") {
        Some(base) => (base, true),
        None => (upper.as_str(), false),
    };

    match base {
        // TINYINT(1) is reported as BOOLEAN; it is still exported as 0/1
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" => {
            if unsigned {
                ValueKind::UnsignedInteger
            } else {
                ValueKind::Integer
            }
        }
        "FLOAT" => ValueKind::Float,
        "DOUBLE" | "REAL" => ValueKind::Double,
        "DECIMAL" | "NUMERIC" => ValueKind::Decimal,
        "DATE" => ValueKind::Date,
        "DATETIME" => ValueKind::DateTime,
        "TIMESTAMP" => ValueKind::Timestamp,
        "TIME" => ValueKind::Time,
        "YEAR" => ValueKind::Year,
        "BIT" => ValueKind::Bit,
        "JSON" => ValueKind::Json,
        "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET" => {
            ValueKind::Text
        }
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "GEOMETRY" => {
            ValueKind::Binary
        }
        "NULL" => ValueKind::Null,
        _ => ValueKind::Other,
    }
}

/// Maps a column's `INFORMATION_SCHEMA.COLUMNS` entry to its encoding family.
///
/// The driver's own type name is derived from protocol flags: it reports
/// `_bin`-collated text as `VARBINARY`/`BLOB` and every `TINYINT(1)` as signed
/// `BOOLEAN`. `DATA_TYPE` and `COLUMN_TYPE` carry the declared type instead.
///
/// # Example
/// ```rust
/// use dbexport_core::adapters::mysql::{ValueKind, classify_column};
///
/// assert_eq!(classify_column("varchar", "varchar(20)"), ValueKind::Text);
/// assert_eq!(classify_column("tinyint", "tinyint(1) unsigned"), ValueKind::UnsignedInteger);
/// ```
pub fn classify_column(data_type: &str, column_type: &str) -> ValueKind {
    let unsigned = column_type
        .split_whitespace()
        .any(|word| word.eq_ignore_ascii_case("unsigned"));
    if unsigned {
        classify_mysql_type(&format!("{} UNSIGNED", data_type.trim()))
    } else {
        classify_mysql_type(data_type)
    }
}

/// Extract the value at `index` as a JSON value.
///
/// `declared` is the column's kind from the schema; without it the kind is
/// taken from the driver's type name.
pub(crate) fn extract_column_value(
    row: &MySqlRow,
    index: usize,
    declared: Option<ValueKind>,
) -> Result<JsonValue, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(JsonValue::Null);
    }
    let kind = declared.unwrap_or_else(|| classify_mysql_type(raw.type_info().name()));

    let value = match kind {
        ValueKind::Null => JsonValue::Null,
        ValueKind::Integer | ValueKind::Year => JsonValue::from(row.try_get_unchecked::<i64, _>(index)?),
        ValueKind::UnsignedInteger => JsonValue::from(row.try_get_unchecked::<u64, _>(index)?),
        ValueKind::Float => float_value(row.try_get_unchecked::<f32, _>(index)?),
        ValueKind::Double => double_value(row.try_get_unchecked::<f64, _>(index)?),
        ValueKind::Decimal | ValueKind::Text => {
            JsonValue::String(row.try_get_unchecked::<String, _>(index)?)
        }
        ValueKind::Date => match row.try_get::<NaiveDate, _>(index) {
            Ok(date) => JsonValue::String(format_date(date)),
            Err(e) => zero_temporal_or(row, index, e)?,
        },
        ValueKind::DateTime => match row.try_get::<NaiveDateTime, _>(index) {
            Ok(datetime) => JsonValue::String(format_datetime(datetime)),
            Err(e) => zero_temporal_or(row, index, e)?,
        },
        ValueKind::Timestamp => match row.try_get::<DateTime<Utc>, _>(index) {
            Ok(timestamp) => JsonValue::String(format_timestamp(timestamp)),
            Err(e) => zero_temporal_or(row, index, e)?,
        },
        ValueKind::Time => {
            let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
            let text = format_time(&bytes).ok_or_else(|| sqlx::Error::Decode(
                format!("unrecognized TIME encoding ({} bytes)", bytes.len()).into(),
            ))?;
            JsonValue::String(text)
        }
        ValueKind::Bit => JsonValue::from(bit_value(&row.try_get_unchecked::<Vec<u8>, _>(index)?)),
        ValueKind::Json => row.try_get_unchecked::<JsonValue, _>(index)?,
        ValueKind::Binary => {
            JsonValue::String(encode_binary(&row.try_get_unchecked::<Vec<u8>, _>(index)?))
        }
        ValueKind::Other => text_or_binary(row.try_get_unchecked::<Vec<u8>, _>(index)?),
    };

    Ok(value)
}

/// Returns `null` for MySQL zero dates, the decode error otherwise.
fn zero_temporal_or(row: &MySqlRow, index: usize, error: sqlx::Error) -> Result<JsonValue, sqlx::Error> {
    let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
    if is_zero_temporal(&bytes) {
        Ok(JsonValue::Null)
    } else {
        Err(error)
    }
}

/// True for the zero date/datetime in either wire format.
///
/// The binary protocol sends it as a lone zero length byte, the text protocol
/// as `0000-00-00[ 00:00:00]`.
pub fn is_zero_temporal(bytes: &[u8]) -> bool {
    bytes == [0] || bytes.is_empty() || bytes.starts_with(b"0000-00-00")
}

/// `YYYY-MM-DD`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `YYYY-MM-DDTHH:MM:SS`, with the fraction only when it is non-zero.
pub fn format_datetime(datetime: NaiveDateTime) -> String {
    datetime.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

/// RFC 3339 in UTC with a `Z` suffix, fraction only when non-zero.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Formats a `TIME` value from its wire bytes.
///
/// The text protocol already carries `[-]HH:MM:SS[.ffffff]`. The binary
/// protocol carries a length byte (0, 8, or 12) followed by the sign, days,
/// hours, minutes, seconds, and microseconds. Returns `None` for anything
/// else.
pub fn format_time(bytes: &[u8]) -> Option<String> {
    match bytes.first() {
        Some(b'0'..=b'9' | b'-') => std::str::from_utf8(bytes).ok().map(str::to_string),
        Some(0) if bytes.len() == 1 => Some("00:00:00".to_string()),
        Some(8 | 12) => {
            let body = bytes.get(1..)?;
            let negative = *body.first()? == 1;
            let days = u32::from_le_bytes(body.get(1..5)?.try_into().ok()?);
            let hours = u64::from(days)
                .saturating_mul(24)
                .saturating_add(u64::from(*body.get(5)?));
            let minutes = *body.get(6)?;
            let seconds = *body.get(7)?;
            let micros = match body.get(8..12) {
                Some(raw) => u32::from_le_bytes(raw.try_into().ok()?),
                None => 0,
            };

            let sign = if negative { "-" } else { "" };
            let mut text = format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds);
            if micros != 0 {
                text.push_str(&format!(".{:06}", micros));
            }
            Some(text)
        }
        _ => None,
    }
}

/// Big-endian `BIT(n)` payload as an unsigned number.
pub fn bit_value(bytes: &[u8]) -> u64 {
    let tail = &bytes[bytes.len().saturating_sub(8)..];
    let mut buf = [0_u8; 8];
    buf[8_usize.saturating_sub(tail.len())..].copy_from_slice(tail);
    u64::from_be_bytes(buf)
}

/// `base64:` followed by the standard base64 alphabet with padding.
pub fn encode_binary(bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("{}{}", BINARY_PREFIX, encoded)
}

/// `FLOAT` columns hold `f32`; widening directly would print noise digits
/// (0.1 becomes 0.10000000149011612), so go through the shortest `f32` text.
pub fn float_value(value: f32) -> JsonValue {
    value
        .to_string()
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map_or(JsonValue::Null, JsonValue::Number)
}

/// Non-finite doubles cannot be represented in JSON and become `null`.
pub fn double_value(value: f64) -> JsonValue {
    serde_json::Number::from_f64(value).map_or(JsonValue::Null, JsonValue::Number)
}

fn text_or_binary(bytes: Vec<u8>) -> JsonValue {
    match String::from_utf8(bytes) {
        Ok(text) => JsonValue::String(text),
        Err(e) => JsonValue::String(encode_binary(e.as_bytes())),
    }
}
