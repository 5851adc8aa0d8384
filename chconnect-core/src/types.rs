use crate::{Error, Result, Value, consume_while, programming_error, skip_whitespace};
use rust_decimal::Decimal;
use std::{
    fmt::{self, Display, Write},
    str::FromStr,
};
use time::{OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Semantic type of a column, as named by the server (`Nullable(DateTime64(3, 'UTC'))`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Nothing,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    Int256,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    UInt128,
    UInt256,
    Float32,
    Float64,
    Decimal { precision: u8, scale: u8 },
    String,
    FixedString(usize),
    Uuid,
    Date,
    Date32,
    DateTime(Option<String>),
    DateTime64(u8, Option<String>),
    Enum8(Vec<(String, i8)>),
    Enum16(Vec<(String, i16)>),
    IPv4,
    IPv6,
    Nullable(Box<ColumnType>),
    LowCardinality(Box<ColumnType>),
    Array(Box<ColumnType>),
    /// Elements with an optional name.
    Tuple(Vec<(Option<String>, ColumnType)>),
    Map(Box<ColumnType>, Box<ColumnType>),
}

impl ColumnType {
    /// Parse a full type name, the whole input must be consumed.
    pub fn parse(name: &str) -> Result<Self> {
        let mut input = name;
        let result = Self::extract(&mut input).and_then(|v| {
            skip_whitespace(&mut input);
            if input.is_empty() {
                Ok(v)
            } else {
                Err(Error::msg(format!("unexpected trailing input `{}`", input)))
            }
        });
        result.map_err(|e| programming_error(format!("Unrecognized type name `{}`: {:#}", name, e)))
    }

    /// Parse one type from the start of `input`, advancing it past the type.
    pub fn extract(input: &mut &str) -> Result<Self> {
        skip_whitespace(input);
        let name = consume_while(input, |c| c.is_ascii_alphanumeric() || *c == '_');
        Ok(match name {
            "Nothing" => ColumnType::Nothing,
            "Bool" | "Boolean" => ColumnType::Bool,
            "Int8" => ColumnType::Int8,
            "Int16" => ColumnType::Int16,
            "Int32" => ColumnType::Int32,
            "Int64" => ColumnType::Int64,
            "Int128" => ColumnType::Int128,
            "Int256" => ColumnType::Int256,
            "UInt8" => ColumnType::UInt8,
            "UInt16" => ColumnType::UInt16,
            "UInt32" => ColumnType::UInt32,
            "UInt64" => ColumnType::UInt64,
            "UInt128" => ColumnType::UInt128,
            "UInt256" => ColumnType::UInt256,
            "Float32" => ColumnType::Float32,
            "Float64" => ColumnType::Float64,
            "String" => ColumnType::String,
            "UUID" => ColumnType::Uuid,
            "Date" => ColumnType::Date,
            "Date32" => ColumnType::Date32,
            "IPv4" => ColumnType::IPv4,
            "IPv6" => ColumnType::IPv6,
            "Decimal" => {
                expect(input, '(')?;
                let precision = extract_integer(input)?;
                let scale = if accept(input, ',') {
                    extract_integer(input)?
                } else {
                    0
                };
                expect(input, ')')?;
                decimal(precision, scale)?
            }
            "Decimal32" | "Decimal64" | "Decimal128" | "Decimal256" => {
                let precision = match name {
                    "Decimal32" => 9,
                    "Decimal64" => 18,
                    "Decimal128" => 38,
                    _ => 76,
                };
                expect(input, '(')?;
                let scale = extract_integer(input)?;
                expect(input, ')')?;
                decimal(precision, scale)?
            }
            "FixedString" => {
                expect(input, '(')?;
                let len = extract_integer(input)?;
                expect(input, ')')?;
                ColumnType::FixedString(len)
            }
            "DateTime" => {
                let mut timezone = None;
                if accept(input, '(') {
                    timezone = Some(extract_quoted(input)?);
                    expect(input, ')')?;
                }
                ColumnType::DateTime(timezone)
            }
            "DateTime64" => {
                expect(input, '(')?;
                let precision = extract_integer(input)?;
                if precision > 9 {
                    return Err(Error::msg(format!(
                        "DateTime64 precision {} is above 9",
                        precision
                    )));
                }
                let timezone = if accept(input, ',') {
                    Some(extract_quoted(input)?)
                } else {
                    None
                };
                expect(input, ')')?;
                ColumnType::DateTime64(precision, timezone)
            }
            "Enum8" => ColumnType::Enum8(extract_enum(input)?),
            "Enum16" => ColumnType::Enum16(extract_enum(input)?),
            "Nullable" | "LowCardinality" | "Array" => {
                expect(input, '(')?;
                let inner = Box::new(Self::extract(input)?);
                expect(input, ')')?;
                match name {
                    "Nullable" => ColumnType::Nullable(inner),
                    "LowCardinality" => ColumnType::LowCardinality(inner),
                    _ => ColumnType::Array(inner),
                }
            }
            "Map" => {
                expect(input, '(')?;
                let key = Box::new(Self::extract(input)?);
                expect(input, ',')?;
                let value = Box::new(Self::extract(input)?);
                expect(input, ')')?;
                ColumnType::Map(key, value)
            }
            "Tuple" => {
                expect(input, '(')?;
                let mut elements = Vec::new();
                loop {
                    elements.push(extract_tuple_element(input)?);
                    if !accept(input, ',') {
                        break;
                    }
                }
                expect(input, ')')?;
                ColumnType::Tuple(elements)
            }
            "" => {
                return Err(Error::msg(format!(
                    "expected a type name at `{}`",
                    input
                )));
            }
            _ => return Err(Error::msg(format!("unknown type `{}`", name))),
        })
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            ColumnType::Nullable(..) | ColumnType::Nothing => true,
            ColumnType::LowCardinality(inner) => inner.is_nullable(),
            _ => false,
        }
    }

    /// The value the server stores for a missing cell of this type. Nullable types
    /// default to [`Value::Null`].
    ///
    /// 256 bit integers have no [`Value`] counterpart, their default is the 128 bit zero.
    pub fn default_value(&self) -> Value {
        let epoch = OffsetDateTime::UNIX_EPOCH;
        match self {
            ColumnType::Nothing | ColumnType::Nullable(..) => Value::Null,
            ColumnType::Bool => Value::Boolean(false),
            ColumnType::Int8 => Value::Int8(0),
            ColumnType::Int16 => Value::Int16(0),
            ColumnType::Int32 => Value::Int32(0),
            ColumnType::Int64 => Value::Int64(0),
            ColumnType::Int128 | ColumnType::Int256 => Value::Int128(0),
            ColumnType::UInt8 => Value::UInt8(0),
            ColumnType::UInt16 => Value::UInt16(0),
            ColumnType::UInt32 => Value::UInt32(0),
            ColumnType::UInt64 => Value::UInt64(0),
            ColumnType::UInt128 | ColumnType::UInt256 => Value::UInt128(0),
            ColumnType::Float32 => Value::Float32(0.0),
            ColumnType::Float64 => Value::Float64(0.0),
            ColumnType::Decimal { .. } => Value::Decimal(Decimal::ZERO),
            ColumnType::String => Value::Varchar(String::new()),
            ColumnType::FixedString(len) => Value::Blob(vec![0; *len].into_boxed_slice()),
            ColumnType::Uuid => Value::Uuid(Uuid::nil()),
            ColumnType::Date | ColumnType::Date32 => Value::Date(epoch.date()),
            ColumnType::DateTime(..) | ColumnType::DateTime64(..) => {
                Value::Timestamp(PrimitiveDateTime::new(epoch.date(), Time::MIDNIGHT))
            }
            ColumnType::Enum8(entries) => entries
                .first()
                .map_or(Value::Null, |(name, _)| Value::Varchar(name.clone())),
            ColumnType::Enum16(entries) => entries
                .first()
                .map_or(Value::Null, |(name, _)| Value::Varchar(name.clone())),
            ColumnType::IPv4 => Value::Varchar("0.0.0.0".into()),
            ColumnType::IPv6 => Value::Varchar("::".into()),
            ColumnType::LowCardinality(inner) => inner.default_value(),
            ColumnType::Array(..) => Value::Array(Vec::new()),
            ColumnType::Tuple(elements) => {
                Value::Tuple(elements.iter().map(|(_, v)| v.default_value()).collect())
            }
            ColumnType::Map(..) => Value::Map(Vec::new()),
        }
    }
}

fn decimal(precision: u8, scale: u8) -> Result<ColumnType> {
    if precision == 0 || precision > 76 || scale > precision {
        return Err(Error::msg(format!(
            "invalid decimal precision {} and scale {}",
            precision, scale
        )));
    }
    Ok(ColumnType::Decimal { precision, scale })
}

fn accept(input: &mut &str, c: char) -> bool {
    skip_whitespace(input);
    if let Some(rest) = input.strip_prefix(c) {
        *input = rest;
        true
    } else {
        false
    }
}

fn expect(input: &mut &str, c: char) -> Result<()> {
    if accept(input, c) {
        Ok(())
    } else {
        Err(Error::msg(format!("expected `{}` at `{}`", c, input)))
    }
}

fn extract_integer<T: FromStr>(input: &mut &str) -> Result<T> {
    skip_whitespace(input);
    let sign = usize::from(input.starts_with('-'));
    let digits = input[sign..].chars().take_while(char::is_ascii_digit).count();
    let (literal, rest) = input.split_at(sign + digits);
    let value = literal
        .parse::<T>()
        .map_err(|_| Error::msg(format!("expected an integer at `{}`", input)))?;
    *input = rest;
    Ok(value)
}

/// Single quoted literal, backslash escapes are honored.
fn extract_quoted(input: &mut &str) -> Result<String> {
    skip_whitespace(input);
    let Some(body) = input.strip_prefix('\'') else {
        return Err(Error::msg(format!("expected a quoted string at `{}`", input)));
    };
    let mut result = String::new();
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, escaped)) => result.push(escaped),
                None => break,
            },
            '\'' => {
                *input = &body[i + 1..];
                return Ok(result);
            }
            _ => result.push(c),
        }
    }
    Err(Error::msg(format!("unterminated string at `{}`", input)))
}

fn extract_enum<T: FromStr>(input: &mut &str) -> Result<Vec<(String, T)>> {
    expect(input, '(')?;
    let mut entries = Vec::new();
    loop {
        let name = extract_quoted(input)?;
        expect(input, '=')?;
        entries.push((name, extract_integer(input)?));
        if !accept(input, ',') {
            break;
        }
    }
    expect(input, ')')?;
    Ok(entries)
}

/// `Int32` or `name Int32`.
fn extract_tuple_element(input: &mut &str) -> Result<(Option<String>, ColumnType)> {
    skip_whitespace(input);
    let mut attempt = *input;
    let identifier = consume_while(&mut attempt, |c| c.is_ascii_alphanumeric() || *c == '_');
    let after = attempt.trim_start();
    let named = !identifier.is_empty()
        && after.len() < attempt.len()
        && after.starts_with(|c: char| c.is_ascii_alphabetic());
    if named {
        *input = after;
        return Ok((Some(identifier.to_string()), ColumnType::extract(input)?));
    }
    Ok((None, ColumnType::extract(input)?))
}

fn write_quoted(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_char('\'')?;
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char('\'')
}

fn write_enum<T: Display>(f: &mut fmt::Formatter<'_>, entries: &[(String, T)]) -> fmt::Result {
    f.write_char('(')?;
    for (i, (name, value)) in entries.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_quoted(f, name)?;
        write!(f, " = {}", value)?;
    }
    f.write_char(')')
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Nothing => f.write_str("Nothing"),
            ColumnType::Bool => f.write_str("Bool"),
            ColumnType::Int8 => f.write_str("Int8"),
            ColumnType::Int16 => f.write_str("Int16"),
            ColumnType::Int32 => f.write_str("Int32"),
            ColumnType::Int64 => f.write_str("Int64"),
            ColumnType::Int128 => f.write_str("Int128"),
            ColumnType::Int256 => f.write_str("Int256"),
            ColumnType::UInt8 => f.write_str("UInt8"),
            ColumnType::UInt16 => f.write_str("UInt16"),
            ColumnType::UInt32 => f.write_str("UInt32"),
            ColumnType::UInt64 => f.write_str("UInt64"),
            ColumnType::UInt128 => f.write_str("UInt128"),
            ColumnType::UInt256 => f.write_str("UInt256"),
            ColumnType::Float32 => f.write_str("Float32"),
            ColumnType::Float64 => f.write_str("Float64"),
            ColumnType::Decimal { precision, scale } => {
                write!(f, "Decimal({}, {})", precision, scale)
            }
            ColumnType::String => f.write_str("String"),
            ColumnType::FixedString(len) => write!(f, "FixedString({})", len),
            ColumnType::Uuid => f.write_str("UUID"),
            ColumnType::Date => f.write_str("Date"),
            ColumnType::Date32 => f.write_str("Date32"),
            ColumnType::DateTime(None) => f.write_str("DateTime"),
            ColumnType::DateTime(Some(timezone)) => {
                f.write_str("DateTime(")?;
                write_quoted(f, timezone)?;
                f.write_char(')')
            }
            ColumnType::DateTime64(precision, timezone) => {
                write!(f, "DateTime64({}", precision)?;
                if let Some(timezone) = timezone {
                    f.write_str(", ")?;
                    write_quoted(f, timezone)?;
                }
                f.write_char(')')
            }
            ColumnType::Enum8(entries) => {
                f.write_str("Enum8")?;
                write_enum(f, entries)
            }
            ColumnType::Enum16(entries) => {
                f.write_str("Enum16")?;
                write_enum(f, entries)
            }
            ColumnType::IPv4 => f.write_str("IPv4"),
            ColumnType::IPv6 => f.write_str("IPv6"),
            ColumnType::Nullable(inner) => write!(f, "Nullable({})", inner),
            ColumnType::LowCardinality(inner) => write!(f, "LowCardinality({})", inner),
            ColumnType::Array(inner) => write!(f, "Array({})", inner),
            ColumnType::Tuple(elements) => {
                f.write_str("Tuple(")?;
                for (i, (name, element)) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if let Some(name) = name {
                        write!(f, "{} ", name)?;
                    }
                    write!(f, "{}", element)?;
                }
                f.write_char(')')
            }
            ColumnType::Map(key, value) => write!(f, "Map({}, {})", key, value),
        }
    }
}

impl FromStr for ColumnType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Maps a type name to its [`ColumnType`].
pub trait TypeRegistry: Send + Sync {
    fn get_from_name(&self, name: &str) -> Result<ColumnType>;
}

/// Registry that knows every type [`ColumnType`] can describe.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinTypes;

impl TypeRegistry for BuiltinTypes {
    fn get_from_name(&self, name: &str) -> Result<ColumnType> {
        ColumnType::parse(name)
    }
}
