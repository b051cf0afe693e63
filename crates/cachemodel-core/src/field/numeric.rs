use crate::{
    field::FieldError,
    value::{Value, Wire},
};
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::str::FromStr;

/// Largest scale a decimal value can carry.
const MAX_DECIMAL_PLACES: u32 = 28;

///
/// Rounding
///
/// Rounding mode applied when a decimal field quantizes its input.
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Rounding {
    /// Ties go to the even neighbour.
    #[default]
    HalfEven,
    /// Ties go away from zero.
    HalfUp,
    /// Ties go toward zero.
    HalfDown,
    /// Always away from zero.
    Up,
    /// Always toward zero.
    Down,
    Ceiling,
    Floor,
}

impl Rounding {
    const fn strategy(self) -> RoundingStrategy {
        match self {
            Self::HalfEven => RoundingStrategy::MidpointNearestEven,
            Self::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            Self::HalfDown => RoundingStrategy::MidpointTowardZero,
            Self::Up => RoundingStrategy::AwayFromZero,
            Self::Down => RoundingStrategy::ToZero,
            Self::Ceiling => RoundingStrategy::ToPositiveInfinity,
            Self::Floor => RoundingStrategy::ToNegativeInfinity,
        }
    }
}

///
/// DecimalSpec
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DecimalSpec {
    pub decimal_places: u32,
    pub rounding: Rounding,
    /// Quantize inputs to `decimal_places`; otherwise values are stored as given.
    pub auto_round: bool,
}

impl DecimalSpec {
    #[must_use]
    pub const fn new(decimal_places: u32) -> Self {
        Self {
            decimal_places,
            rounding: Rounding::HalfEven,
            auto_round: false,
        }
    }

    #[must_use]
    pub const fn rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    #[must_use]
    pub const fn auto_round(mut self) -> Self {
        self.auto_round = true;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), FieldError> {
        if self.decimal_places > MAX_DECIMAL_PLACES {
            return Err(FieldError::validation(format!(
                "decimal_places {} exceeds the maximum scale {MAX_DECIMAL_PLACES}",
                self.decimal_places,
            )));
        }

        Ok(())
    }

    fn quantize(&self, value: Decimal) -> Decimal {
        if self.auto_round {
            // fixed scale, so equal amounts share one key string
            let mut rounded =
                value.round_dp_with_strategy(self.decimal_places, self.rounding.strategy());
            rounded.rescale(self.decimal_places);
            rounded
        } else {
            value
        }
    }
}

///
/// INTEGER
///

fn parse_int(text: &str) -> Result<i64, FieldError> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| FieldError::validation(format!("invalid integer literal '{text}'")))
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]
fn integral_float(f: f64) -> Result<i64, FieldError> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Ok(f as i64)
    } else {
        Err(FieldError::validation(format!(
            "float {f} is not an integral value"
        )))
    }
}

pub(super) fn coerce_integer(input: Value) -> Result<Value, FieldError> {
    match input {
        Value::Int(v) => Ok(Value::Int(v)),
        Value::Bool(v) => Ok(Value::Int(v.into())),
        Value::Float(f) => integral_float(f).map(Value::Int),
        Value::Text(s) => parse_int(&s).map(Value::Int),
        other => Err(FieldError::unexpected_value("integer", &other)),
    }
}

pub(super) fn encode_integer(value: &Value) -> Result<Wire, FieldError> {
    match value {
        Value::Int(v) => Ok(Wire::Int(*v)),
        other => Err(FieldError::unexpected_value("integer", other)),
    }
}

pub(super) fn decode_integer(wire: Wire) -> Result<Value, FieldError> {
    match wire {
        Wire::Int(v) => Ok(Value::Int(v)),
        Wire::Uint(v) => Err(FieldError::validation(format!(
            "stored integer {v} overflows i64"
        ))),
        Wire::Float(f) => integral_float(f).map(Value::Int),
        Wire::Text(s) => parse_int(&s).map(Value::Int),
        other => Err(FieldError::unexpected_wire("integer", &other)),
    }
}

///
/// FLOAT
///

fn parse_float(text: &str) -> Result<f64, FieldError> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| FieldError::validation(format!("invalid float literal '{text}'")))
}

#[allow(clippy::cast_precision_loss)]
pub(super) fn coerce_float(input: Value) -> Result<Value, FieldError> {
    match input {
        Value::Float(v) => Ok(Value::Float(v)),
        Value::Int(v) => Ok(Value::Float(v as f64)),
        Value::Decimal(d) => d
            .to_f64()
            .map(Value::Float)
            .ok_or_else(|| FieldError::validation(format!("decimal {d} is out of float range"))),
        Value::Text(s) => parse_float(&s).map(Value::Float),
        other => Err(FieldError::unexpected_value("float", &other)),
    }
}

pub(super) fn encode_float(value: &Value) -> Result<Wire, FieldError> {
    match value {
        Value::Float(v) => Ok(Wire::Float(*v)),
        other => Err(FieldError::unexpected_value("float", other)),
    }
}

#[allow(clippy::cast_precision_loss)]
pub(super) fn decode_float(wire: Wire) -> Result<Value, FieldError> {
    match wire {
        Wire::Float(v) => Ok(Value::Float(v)),
        Wire::Int(v) => Ok(Value::Float(v as f64)),
        Wire::Uint(v) => Ok(Value::Float(v as f64)),
        Wire::Text(s) => parse_float(&s).map(Value::Float),
        other => Err(FieldError::unexpected_wire("float", &other)),
    }
}

///
/// DECIMAL
///

fn parse_decimal(text: &str) -> Result<Decimal, FieldError> {
    let text = text.trim();

    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| FieldError::validation(format!("invalid decimal literal '{text}'")))
}

fn decimal_from_float(f: f64) -> Result<Decimal, FieldError> {
    Decimal::from_f64(f)
        .ok_or_else(|| FieldError::validation(format!("float {f} cannot be represented as decimal")))
}

pub(super) fn coerce_decimal(spec: &DecimalSpec, input: Value) -> Result<Value, FieldError> {
    let value = match input {
        Value::Decimal(d) => d,
        Value::Int(v) => Decimal::from(v),
        Value::Float(f) => decimal_from_float(f)?,
        Value::Text(s) => parse_decimal(&s)?,
        other => return Err(FieldError::unexpected_value("decimal", &other)),
    };

    Ok(Value::Decimal(spec.quantize(value)))
}

pub(super) fn encode_decimal(value: &Value) -> Result<Wire, FieldError> {
    match value {
        // text keeps every digit through codecs that only know doubles
        Value::Decimal(d) => Ok(Wire::Text(d.to_string())),
        other => Err(FieldError::unexpected_value("decimal", other)),
    }
}

pub(super) fn decode_decimal(spec: &DecimalSpec, wire: Wire) -> Result<Value, FieldError> {
    let value = match wire {
        Wire::Text(s) => parse_decimal(&s)?,
        Wire::Int(v) => Decimal::from(v),
        Wire::Uint(v) => Decimal::from(v),
        Wire::Float(f) => decimal_from_float(f)?,
        other => return Err(FieldError::unexpected_wire("decimal", &other)),
    };

    Ok(Value::Decimal(spec.quantize(value)))
}
