use crate::{Result, Value, consume_while, programming_error};
use std::{collections::BTreeMap, fmt::Write};
use time::{Date, PrimitiveDateTime, Time, UtcOffset};

/// Named query parameters, referenced in the query text as `%(name)s`.
pub type Parameters = BTreeMap<String, Value>;

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}

macro_rules! write_float {
    ($out:ident, $value:expr) => {{
        let value = $value;
        if value.is_nan() {
            $out.push_str("nan");
        } else if value.is_infinite() {
            $out.push_str(if value > 0.0 { "inf" } else { "-inf" });
        } else {
            let mut buffer = ryu::Buffer::new();
            $out.push_str(buffer.format_finite(value));
        }
    }};
}

/// Timezone reported by the server.
///
/// Only UTC aliases and explicit offsets resolve to a fixed offset, other zone names
/// would need a timezone database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTimezone {
    name: String,
    offset: Option<UtcOffset>,
}

impl ServerTimezone {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let offset = resolve_offset(name.trim());
        Self { name, offset }
    }

    pub fn utc() -> Self {
        Self::new("UTC")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn offset(&self) -> Option<UtcOffset> {
        self.offset
    }
}

impl Default for ServerTimezone {
    fn default() -> Self {
        Self::utc()
    }
}

fn resolve_offset(name: &str) -> Option<UtcOffset> {
    const UTC_ALIASES: &[&str] = &[
        "UTC",
        "UCT",
        "GMT",
        "GMT0",
        "Zulu",
        "Universal",
        "Greenwich",
        "Etc/UTC",
        "Etc/UCT",
        "Etc/GMT",
        "Etc/GMT0",
        "Etc/Zulu",
        "Etc/Universal",
        "Etc/Greenwich",
    ];
    if UTC_ALIASES.iter().any(|v| v.eq_ignore_ascii_case(name)) {
        return Some(UtcOffset::UTC);
    }
    // POSIX style zones have the sign reversed: Etc/GMT-3 is three hours ahead of UTC
    if let Some(offset) = name.strip_prefix("Etc/GMT") {
        return parse_offset(offset).map(|v| -v);
    }
    let offset = name
        .strip_prefix("UTC")
        .or_else(|| name.strip_prefix("GMT"))
        .unwrap_or(name);
    parse_offset(offset)
}

/// Parses `+03`, `-5`, `+05:30` or `+0530`.
fn parse_offset(mut input: &str) -> Option<UtcOffset> {
    let sign = match input.chars().next()? {
        '+' => 1,
        '-' => -1,
        _ => return None,
    };
    input = &input[1..];
    let digits = consume_while(&mut input, char::is_ascii_digit);
    let (hours, mut minutes) = match digits.len() {
        1 | 2 => (digits, ""),
        4 => digits.split_at(2),
        _ => return None,
    };
    if minutes.is_empty() {
        if let Some(rest) = input.strip_prefix(':') {
            input = rest;
            minutes = consume_while(&mut input, char::is_ascii_digit);
            if minutes.len() != 2 {
                return None;
            }
        }
    }
    if !input.is_empty() {
        return None;
    }
    let hours = hours.parse::<i8>().ok()?;
    let minutes = if minutes.is_empty() {
        0
    } else {
        minutes.parse::<i8>().ok()?
    };
    UtcOffset::from_hms(sign * hours, sign * minutes, 0).ok()
}

/// Render `value` as a literal that can be embedded in a query.
///
/// Timestamps carrying an offset are shifted to the server timezone so the server reads
/// them as the same instant.
pub fn escape_value(value: &Value, timezone: &ServerTimezone) -> Result<String> {
    let mut out = String::new();
    write_value(&mut out, value, timezone)?;
    Ok(out)
}

fn write_value(out: &mut String, value: &Value, timezone: &ServerTimezone) -> Result<()> {
    match value {
        Value::Null => out.push_str("NULL"),
        Value::Boolean(v) => out.push_str(["false", "true"][*v as usize]),
        Value::Int8(v) => write_integer!(out, *v),
        Value::Int16(v) => write_integer!(out, *v),
        Value::Int32(v) => write_integer!(out, *v),
        Value::Int64(v) => write_integer!(out, *v),
        Value::Int128(v) => write_integer!(out, *v),
        Value::UInt8(v) => write_integer!(out, *v),
        Value::UInt16(v) => write_integer!(out, *v),
        Value::UInt32(v) => write_integer!(out, *v),
        Value::UInt64(v) => write_integer!(out, *v),
        Value::UInt128(v) => write_integer!(out, *v),
        Value::Float32(v) => write_float!(out, *v),
        Value::Float64(v) => write_float!(out, *v),
        Value::Decimal(v) => drop(write!(out, "{}", v)),
        Value::Varchar(v) => write_string(out, v),
        Value::Blob(v) => write_blob(out, v),
        Value::Date(v) => {
            out.push('\'');
            write_date(out, v);
            out.push('\'');
        }
        Value::Time(v) => {
            out.push('\'');
            write_time(out, v);
            out.push('\'');
        }
        Value::Timestamp(v) => {
            out.push('\'');
            write_timestamp(out, v);
            out.push('\'');
        }
        Value::TimestampWithTimezone(v) => match timezone.offset() {
            Some(offset) => {
                let local = v.to_offset(offset);
                out.push('\'');
                write_timestamp(out, &PrimitiveDateTime::new(local.date(), local.time()));
                out.push('\'');
            }
            None => {
                let utc = v.to_offset(UtcOffset::UTC);
                out.push_str("toDateTime64('");
                write_timestamp(out, &PrimitiveDateTime::new(utc.date(), utc.time()));
                out.push_str("', 9, 'UTC')");
            }
        },
        Value::Uuid(v) => drop(write!(out, "'{}'", v)),
        Value::Array(values) => {
            out.push('[');
            write_sequence(out, values, timezone)?;
            out.push(']');
        }
        Value::Tuple(values) => {
            out.push('(');
            write_sequence(out, values, timezone)?;
            out.push(')');
        }
        Value::Map(entries) => {
            out.push('{');
            for (i, (k, v)) in entries.iter().enumerate() {
                if k.is_null() {
                    return Err(programming_error(format!(
                        "Cannot escape the parameter value {:?}: map keys cannot be NULL",
                        value
                    )));
                }
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, k, timezone)?;
                out.push_str(": ");
                write_value(out, v, timezone)?;
            }
            out.push('}');
        }
    };
    Ok(())
}

fn write_sequence(out: &mut String, values: &[Value], timezone: &ServerTimezone) -> Result<()> {
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_value(out, v, timezone)?;
    }
    Ok(())
}

pub(crate) fn write_string(out: &mut String, value: &str) {
    out.push('\'');
    let mut position = 0;
    for (i, c) in value.char_indices() {
        let replace = match c {
            '\\' => "\\\\",
            '\'' => "\\'",
            '\n' => "\\n",
            '\r' => "\\r",
            '\t' => "\\t",
            '\0' => "\\0",
            _ => continue,
        };
        out.push_str(&value[position..i]);
        out.push_str(replace);
        position = i + c.len_utf8();
    }
    out.push_str(&value[position..]);
    out.push('\'');
}

fn write_blob(out: &mut String, value: &[u8]) {
    out.push('\'');
    for b in value {
        out.push_str("\\x");
        out.push_str(&hex::encode_upper([*b]));
    }
    out.push('\'');
}

fn write_date(out: &mut String, value: &Date) {
    let _ = write!(
        out,
        "{:04}-{:02}-{:02}",
        value.year(),
        value.month() as u8,
        value.day()
    );
}

fn write_time(out: &mut String, value: &Time) {
    let _ = write!(
        out,
        "{:02}:{:02}:{:02}",
        value.hour(),
        value.minute(),
        value.second()
    );
    let mut subsecond = value.nanosecond();
    if subsecond == 0 {
        return;
    }
    let mut width = 9;
    while subsecond % 10 == 0 {
        subsecond /= 10;
        width -= 1;
    }
    let _ = write!(out, ".{:0width$}", subsecond);
}

fn write_timestamp(out: &mut String, value: &PrimitiveDateTime) {
    write_date(out, &value.date());
    out.push(' ');
    write_time(out, &value.time());
}

/// Replace every `%(name)s` placeholder in `query` with the escaped value of `name`.
///
/// `%%` collapses to a single `%`, any other `%` is kept as it is. Parameters not
/// referenced by the query are ignored.
pub fn substitute_parameters(
    query: &str,
    parameters: &Parameters,
    timezone: &ServerTimezone,
) -> Result<String> {
    let mut out = String::with_capacity(query.len() + parameters.len() * 8);
    let mut rest = query;
    while let Some(position) = rest.find('%') {
        out.push_str(&rest[..position]);
        rest = &rest[position + 1..];
        if let Some(tail) = rest.strip_prefix('%') {
            out.push('%');
            rest = tail;
            continue;
        }
        if let Some(tail) = rest.strip_prefix('(') {
            if let Some(end) = tail.find(')') {
                let name = &tail[..end];
                let Some(after) = tail[end + 1..].strip_prefix('s') else {
                    return Err(programming_error(format!(
                        "Unsupported placeholder `%({})` in the query, only `%(name)s` is supported",
                        name
                    )));
                };
                let Some(value) = parameters.get(name) else {
                    return Err(programming_error(format!(
                        "Missing the value for the query parameter `{}`",
                        name
                    )));
                };
                write_value(&mut out, value, timezone)?;
                rest = after;
                continue;
            }
        }
        out.push('%');
    }
    out.push_str(rest);
    Ok(out)
}
