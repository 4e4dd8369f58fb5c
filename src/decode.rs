//! JSON decoding into the record model
//!
//! Converts `serde_json::Value` trees into [`Record`]s. Every value is tagged
//! once here so the flattener never inspects raw JSON. ISO date and
//! date-time strings become date values unless detection is turned off.

use crate::error::{ExportError, Result};
use crate::record::{FieldValue, Record};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static ISO_DATETIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?$").unwrap()
});

static ISO_DATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap()
});

static ISO_TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{2}:\d{2}:\d{2}(\.\d+)?$").unwrap()
});

/// Options for turning JSON into records
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Turn ISO date and date-time strings into date values
    pub detect_dates: bool,

    /// Turn `HH:MM:SS` strings into time-of-day values
    pub detect_times: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            detect_dates: true,
            detect_times: false,
        }
    }
}

/// Decode a batch: an array of objects, or a single object as a batch of one
pub fn decode_records(value: Value, options: &DecodeOptions) -> Result<Vec<Record>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| decode_record(item, index, options))
            .collect(),
        other => Ok(vec![decode_record(other, 0, options)?]),
    }
}

/// Decode one batch item, which must be an object
pub fn decode_record(value: Value, index: usize, options: &DecodeOptions) -> Result<Record> {
    match value {
        Value::Object(map) => decode_object(map, "", options),
        other => Err(ExportError::NotAnObject {
            index,
            found: json_kind(&other),
        }),
    }
}

impl TryFrom<Value> for Record {
    type Error = ExportError;

    fn try_from(value: Value) -> Result<Self> {
        decode_record(value, 0, &DecodeOptions::default())
    }
}

fn decode_object(map: Map<String, Value>, path: &str, options: &DecodeOptions) -> Result<Record> {
    let mut record = Record::new();

    for (key, value) in map.into_iter() {
        let field_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", path, key)
        };

        let value = decode_value(value, &field_path, options)?;
        record.insert(key, value);
    }

    Ok(record)
}

fn decode_value(value: Value, path: &str, options: &DecodeOptions) -> Result<FieldValue> {
    let decoded = match value {
        Value::Null => FieldValue::Null,
        Value::Bool(b) => FieldValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FieldValue::Int(i),
            // u64 beyond i64::MAX, or a fraction
            None => n
                .as_f64()
                .map_or_else(|| FieldValue::String(n.to_string()), FieldValue::Float),
        },
        Value::String(s) => decode_string(s, options),
        Value::Object(map) => FieldValue::Object(decode_object(map, path, options)?),
        Value::Array(items) => {
            let mut elements = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                match item {
                    Value::Object(map) => {
                        let element_path = format!("{}[{}]", path, index);
                        elements.push(decode_object(map, &element_path, options)?);
                    }
                    other => {
                        return Err(ExportError::MalformedArrayElement {
                            field: path.to_string(),
                            index,
                            found: json_kind(&other),
                        });
                    }
                }
            }
            FieldValue::Array(elements)
        }
    };

    Ok(decoded)
}

/// Tag a string value, recognizing dates and times when enabled
pub fn decode_string(s: String, options: &DecodeOptions) -> FieldValue {
    if options.detect_dates {
        if let Some(date) = parse_date(&s) {
            return FieldValue::Date(date);
        }
        if let Some(date_time) = parse_date_time(&s) {
            return FieldValue::DateTime(date_time);
        }
    }

    if options.detect_times {
        if let Some(time) = parse_time(&s) {
            return FieldValue::Time(time);
        }
    }

    FieldValue::String(s)
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    if !ISO_DATE_REGEX.is_match(s) {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Offsets are normalized to UTC
fn parse_date_time(s: &str) -> Option<NaiveDateTime> {
    let caps = ISO_DATETIME_REGEX.captures(s)?;

    if caps.get(2).is_some() {
        DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc())
    } else {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()
    }
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    if !ISO_TIME_REGEX.is_match(s) {
        return None;
    }
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f").ok()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
