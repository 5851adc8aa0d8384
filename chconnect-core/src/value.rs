use rust_decimal::Decimal;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed value used for query parameters, insert data and result cells.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Int128(i128),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    UInt128(u128),
    Float32(f32),
    Float64(f64),
    Decimal(Decimal),
    Varchar(String),
    Blob(Box<[u8]>),
    Date(Date),
    Time(Time),
    Timestamp(PrimitiveDateTime),
    TimestampWithTimezone(OffsetDateTime),
    Uuid(Uuid),
    Array(Vec<Value>),
    Tuple(Vec<Value>),
    /// Entries keep their insertion order.
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Varchar(v) => Some(v),
            _ => None,
        }
    }

    /// Integer (or boolean) content widened to `i128`, `None` for every other variant
    /// and for `UInt128` values that do not fit.
    pub fn as_i128(&self) -> Option<i128> {
        Some(match *self {
            Value::Boolean(v) => v as i128,
            Value::Int8(v) => v as i128,
            Value::Int16(v) => v as i128,
            Value::Int32(v) => v as i128,
            Value::Int64(v) => v as i128,
            Value::Int128(v) => v,
            Value::UInt8(v) => v as i128,
            Value::UInt16(v) => v as i128,
            Value::UInt32(v) => v as i128,
            Value::UInt64(v) => v as i128,
            Value::UInt128(v) => i128::try_from(v).ok()?,
            _ => return None,
        })
    }
}

macro_rules! impl_from_value {
    ($source:ty, $into:path) => {
        impl From<$source> for Value {
            fn from(value: $source) -> Self {
                $into(value)
            }
        }
    };
}

impl_from_value!(bool, Value::Boolean);
impl_from_value!(i8, Value::Int8);
impl_from_value!(i16, Value::Int16);
impl_from_value!(i32, Value::Int32);
impl_from_value!(i64, Value::Int64);
impl_from_value!(i128, Value::Int128);
impl_from_value!(u8, Value::UInt8);
impl_from_value!(u16, Value::UInt16);
impl_from_value!(u32, Value::UInt32);
impl_from_value!(u64, Value::UInt64);
impl_from_value!(u128, Value::UInt128);
impl_from_value!(f32, Value::Float32);
impl_from_value!(f64, Value::Float64);
impl_from_value!(Decimal, Value::Decimal);
impl_from_value!(String, Value::Varchar);
impl_from_value!(Box<[u8]>, Value::Blob);
impl_from_value!(Date, Value::Date);
impl_from_value!(Time, Value::Time);
impl_from_value!(PrimitiveDateTime, Value::Timestamp);
impl_from_value!(OffsetDateTime, Value::TimestampWithTimezone);
impl_from_value!(Uuid, Value::Uuid);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(value.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}
