//! Turns the `{schema, rows: [{f: [{v}]}]}` wire shape into [`Row`]s.
//!
//! Every cell arrives as a string (or null). Its column's declared type picks a coercion
//! from a static table, see [`coercion`]. Decoding is all-or-nothing: the first cell that
//! fails to coerce aborts the whole result set.

use time::OffsetDateTime;

use super::{QueryResponse, Row, TableRow, Value};
use crate::error::{CellError, DecodeError, TimestampError};
use crate::schema::{FieldType, TableFieldSchema, TableSchema};

/// Parses one string-encoded cell into a [`Value`].
pub type Coercion = fn(&str) -> Result<Value, CellError>;

/// Decodes every row in a query response. A response without `rows` (DDL, empty results)
/// decodes to an empty vec.
pub fn decode(response: &QueryResponse) -> Result<Vec<Row>, DecodeError> {
    match response.rows.as_deref() {
        Some(rows) => decode_rows(response.schema.as_ref(), rows),
        None => Ok(Vec::new()),
    }
}

pub fn decode_rows(
    schema: Option<&TableSchema>,
    rows: &[TableRow],
) -> Result<Vec<Row>, DecodeError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let schema = schema.ok_or(DecodeError::MissingSchema)?;

    rows.iter()
        .enumerate()
        .map(|(index, row)| decode_row(index, &schema.fields, row))
        .collect()
}

fn decode_row(
    index: usize,
    fields: &[TableFieldSchema],
    row: &TableRow,
) -> Result<Row, DecodeError> {
    if row.f.len() != fields.len() {
        return Err(DecodeError::CellCount {
            row: index,
            expected: fields.len(),
            found: row.f.len(),
        });
    }

    let mut decoded = Row::with_capacity(fields.len());

    for (cell, field) in row.f.iter().zip(fields) {
        let value = match cell.v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::String(ref raw) => {
                coercion(&field.ty)(raw).map_err(|reason| DecodeError::Cell {
                    row: index,
                    field: field.name.clone(),
                    ty: field.ty.clone(),
                    value: Box::from(raw.as_str()),
                    reason,
                })?
            }
            // REPEATED and RECORD cells carry nested {v} structures, those are handed
            // back as-is.
            ref nested => Value::Json(nested.clone()),
        };

        decoded.push(field.name.clone(), value);
    }

    Ok(decoded)
}

/// The coercion applied to cells of a given type.
pub fn coercion(ty: &FieldType) -> Coercion {
    match ty {
        FieldType::Integer => coerce_integer,
        FieldType::Float | FieldType::Numeric => coerce_float,
        FieldType::Bool => coerce_bool,
        FieldType::Timestamp | FieldType::DateTime => coerce_timestamp,
        FieldType::Json => coerce_json,
        // TODO: RECORD/STRUCT columns stay raw until nested rows get decoded against
        // `TableFieldSchema::fields`.
        FieldType::String
        | FieldType::Bytes
        | FieldType::Date
        | FieldType::Time
        | FieldType::Geography
        | FieldType::BigNumeric
        | FieldType::Record
        | FieldType::Interval
        | FieldType::Range
        | FieldType::Other(_) => pass_through,
    }
}

fn coerce_integer(raw: &str) -> Result<Value, CellError> {
    raw.parse().map(Value::Integer).map_err(CellError::from)
}

fn coerce_float(raw: &str) -> Result<Value, CellError> {
    raw.parse().map(Value::Float).map_err(CellError::from)
}

fn coerce_bool(raw: &str) -> Result<Value, CellError> {
    Ok(Value::Bool(raw == "true"))
}

fn coerce_timestamp(raw: &str) -> Result<Value, CellError> {
    parse_epoch_seconds(raw).map(Value::Timestamp)
}

fn coerce_json(raw: &str) -> Result<Value, CellError> {
    serde_json::from_str(raw).map(Value::Json).map_err(CellError::from)
}

fn pass_through(raw: &str) -> Result<Value, CellError> {
    Ok(Value::String(raw.to_owned()))
}

/// Parses Unix epoch seconds, as BigQuery encodes timestamps (`"1.7E9"`, `"1700000000.5"`).
fn parse_epoch_seconds(raw: &str) -> Result<OffsetDateTime, CellError> {
    let raw = raw.trim();

    let nanos = match parse_decimal_nanos(raw) {
        Some(nanos) => nanos,
        None => {
            // not plain decimal notation, let the float parser explain why
            let secs: f64 = raw.parse()?;
            let reason = if secs.is_finite() {
                TimestampError::OutOfRange
            } else {
                TimestampError::NotFinite
            };
            return Err(CellError::Timestamp(reason));
        }
    };

    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .map_err(|_| CellError::Timestamp(TimestampError::OutOfRange))
}

/// Exact decimal -> nanosecond conversion, avoiding the precision loss of going through
/// an f64. Digits past nanosecond precision are truncated.
fn parse_decimal_nanos(raw: &str) -> Option<i128> {
    const NANOS_EXP: i32 = 9;

    let (mantissa, exp) = match raw.split_once(['e', 'E']) {
        Some((mantissa, exp)) => (mantissa, exp.parse::<i32>().ok()?),
        None => (raw, 0),
    };

    let (negative, mantissa) = match mantissa.as_bytes().first()? {
        b'-' => (true, &mantissa[1..]),
        b'+' => (false, &mantissa[1..]),
        _ => (false, mantissa),
    };

    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    if !int_part.bytes().chain(frac_part.bytes()).all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    // fractional digits below a nanosecond once the exponent is applied never reach the
    // result, and would only risk overflowing the accumulator
    let precision = exp.saturating_add(NANOS_EXP).max(0);
    let kept_len = frac_part.len().min(usize::try_from(precision).ok()?);
    let kept_frac = &frac_part[..kept_len];

    let mut value: i128 = 0;
    for byte in int_part.bytes().chain(kept_frac.bytes()) {
        value = value.checked_mul(10)?.checked_add(i128::from(byte - b'0'))?;
    }

    let frac_len = i32::try_from(kept_len).ok()?;
    let scale = exp.checked_add(NANOS_EXP)?.checked_sub(frac_len)?;

    let nanos = if scale >= 0 {
        value.checked_mul(10_i128.checked_pow(scale.unsigned_abs())?)?
    } else {
        match 10_i128.checked_pow(scale.unsigned_abs()) {
            Some(divisor) => value / divisor,
            None => 0,
        }
    };

    Some(if negative { -nanos } else { nanos })
}
