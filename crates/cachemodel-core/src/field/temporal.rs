use crate::{
    field::FieldError,
    value::{DATE_FORMAT, DATE_TIME_FORMAT, TIME_FORMAT, Value, Wire},
};
use chrono::{
    DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Timelike, Utc,
    format::{Item, StrftimeItems},
};
use std::sync::Arc;

///
/// TemporalFormats
///
/// Ordered strftime formats accepted for text input. The first format that
/// parses wins.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TemporalFormats(Arc<[String]>);

impl TemporalFormats {
    pub fn new<I, S>(formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(formats.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn date() -> Self {
        Self::new([DATE_FORMAT])
    }

    #[must_use]
    pub fn time() -> Self {
        Self::new([TIME_FORMAT, "%H:%M"])
    }

    #[must_use]
    pub fn datetime() -> Self {
        Self::new([DATE_TIME_FORMAT, "%Y-%m-%dT%H:%M:%S%.f", DATE_FORMAT])
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub(crate) fn validate(&self) -> Result<(), FieldError> {
        if self.0.is_empty() {
            return Err(FieldError::validation("at least one format is required"));
        }

        for format in self.0.iter() {
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(FieldError::validation(format!(
                    "invalid format string '{format}'"
                )));
            }
        }

        Ok(())
    }

    /// First match wins, trying `canonical` (stored text) before the
    /// configured formats. Input text passes `None`.
    fn parse<T>(
        &self,
        canonical: Option<&str>,
        text: &str,
        parse: impl Fn(&str, &str) -> Option<T>,
    ) -> Result<T, FieldError> {
        let text = text.trim();

        canonical
            .into_iter()
            .chain(self.0.iter().map(String::as_str))
            .find_map(|format| parse(text, format))
            .ok_or_else(|| FieldError::validation(format!("'{text}' matches no accepted format")))
    }

    fn parse_date(&self, canonical: Option<&str>, text: &str) -> Result<NaiveDate, FieldError> {
        self.parse(canonical, text, |t, f| NaiveDate::parse_from_str(t, f).ok())
    }

    fn parse_time(&self, canonical: Option<&str>, text: &str) -> Result<NaiveTime, FieldError> {
        self.parse(canonical, text, |t, f| NaiveTime::parse_from_str(t, f).ok())
    }

    fn parse_datetime(
        &self,
        canonical: Option<&str>,
        text: &str,
    ) -> Result<NaiveDateTime, FieldError> {
        self.parse(canonical, text, |t, f| {
            NaiveDateTime::parse_from_str(t, f)
                .ok()
                .or_else(|| NaiveDate::parse_from_str(t, f).ok().map(at_midnight))
        })
    }
}

fn at_midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

///
/// DATE / TIME / DATETIME
///

pub(super) fn coerce_date(formats: &TemporalFormats, input: Value) -> Result<Value, FieldError> {
    match input {
        Value::Date(d) => Ok(Value::Date(d)),
        Value::DateTime(dt) => Ok(Value::Date(dt.date())),
        Value::Text(s) => formats.parse_date(None, &s).map(Value::Date),
        other => Err(FieldError::validation(format!(
            "cannot parse a date from {}",
            other.kind_name()
        ))),
    }
}

pub(super) fn coerce_time(formats: &TemporalFormats, input: Value) -> Result<Value, FieldError> {
    match input {
        Value::Time(t) => Ok(Value::Time(t)),
        Value::DateTime(dt) => Ok(Value::Time(dt.time())),
        Value::Text(s) => formats.parse_time(None, &s).map(Value::Time),
        other => Err(FieldError::validation(format!(
            "cannot parse a time from {}",
            other.kind_name()
        ))),
    }
}

pub(super) fn coerce_datetime(formats: &TemporalFormats, input: Value) -> Result<Value, FieldError> {
    match input {
        Value::DateTime(dt) => Ok(Value::DateTime(dt)),
        Value::Date(d) => Ok(Value::DateTime(at_midnight(d))),
        Value::Text(s) => formats.parse_datetime(None, &s).map(Value::DateTime),
        other => Err(FieldError::validation(format!(
            "cannot parse a datetime from {}",
            other.kind_name()
        ))),
    }
}

pub(super) fn encode_date(value: &Value) -> Result<Wire, FieldError> {
    match value {
        Value::Date(d) => Ok(Wire::Text(d.format(DATE_FORMAT).to_string())),
        other => Err(FieldError::unexpected_value("date", other)),
    }
}

pub(super) fn encode_time(value: &Value) -> Result<Wire, FieldError> {
    match value {
        Value::Time(t) => Ok(Wire::Text(t.format(TIME_FORMAT).to_string())),
        other => Err(FieldError::unexpected_value("time", other)),
    }
}

pub(super) fn encode_datetime(value: &Value) -> Result<Wire, FieldError> {
    match value {
        Value::DateTime(dt) => Ok(Wire::Text(dt.format(DATE_TIME_FORMAT).to_string())),
        other => Err(FieldError::unexpected_value("datetime", other)),
    }
}

pub(super) fn decode_date(formats: &TemporalFormats, wire: Wire) -> Result<Value, FieldError> {
    match wire {
        Wire::Text(s) => formats.parse_date(Some(DATE_FORMAT), &s).map(Value::Date),
        other => Err(FieldError::unexpected_wire("date", &other)),
    }
}

pub(super) fn decode_time(formats: &TemporalFormats, wire: Wire) -> Result<Value, FieldError> {
    match wire {
        Wire::Text(s) => formats.parse_time(Some(TIME_FORMAT), &s).map(Value::Time),
        other => Err(FieldError::unexpected_wire("time", &other)),
    }
}

pub(super) fn decode_datetime(formats: &TemporalFormats, wire: Wire) -> Result<Value, FieldError> {
    match wire {
        Wire::Text(s) => formats.parse_datetime(Some(DATE_TIME_FORMAT), &s).map(Value::DateTime),
        other => Err(FieldError::unexpected_wire("datetime", &other)),
    }
}

///
/// DATETIME TZ
///
/// Only aware datetimes are accepted. Values are normalised to UTC, so two
/// inputs naming the same instant in different offsets coerce identically.
///

pub(super) fn coerce_datetime_tz(input: Value) -> Result<Value, FieldError> {
    match input {
        Value::DateTimeTz(dt) => Ok(Value::DateTimeTz(dt.with_timezone(&Utc).fixed_offset())),
        Value::DateTime(_) => Err(FieldError::validation(
            "datetime has no timezone; an aware datetime is required",
        )),
        other => Err(FieldError::validation(format!(
            "expected an aware datetime, found {}",
            other.kind_name()
        ))),
    }
}

pub(super) fn encode_datetime_tz(value: &Value) -> Result<Wire, FieldError> {
    match value {
        Value::DateTimeTz(dt) => Ok(Wire::Text(
            dt.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
        )),
        other => Err(FieldError::unexpected_value("aware datetime", other)),
    }
}

pub(super) fn decode_datetime_tz(wire: Wire) -> Result<Value, FieldError> {
    match wire {
        Wire::Text(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| Value::DateTimeTz(dt.with_timezone(&Utc).fixed_offset()))
            .map_err(|e| FieldError::validation(format!("invalid stored datetime '{s}': {e}"))),
        other => Err(FieldError::unexpected_wire("aware datetime", &other)),
    }
}

///
/// TimestampResolution
///
/// Number of fractional-second digits a timestamp keeps, 0 through 6.
/// 0 keeps whole seconds, 3 milliseconds, 6 microseconds.
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct TimestampResolution(u8);

impl TimestampResolution {
    pub const SECONDS: Self = Self(0);
    pub const MILLIS: Self = Self(3);
    pub const MICROS: Self = Self(6);

    const MAX_DIGITS: u8 = 6;

    pub fn digits(digits: u8) -> Result<Self, FieldError> {
        if digits > Self::MAX_DIGITS {
            return Err(FieldError::validation(format!(
                "timestamp resolution must be 0..={} fractional digits, got {digits}",
                Self::MAX_DIGITS
            )));
        }

        Ok(Self(digits))
    }

    /// Accept a power-of-ten scale (1, 10, .., 1_000_000) and normalise it
    /// to a digit count.
    pub fn from_scale(scale: u64) -> Result<Self, FieldError> {
        (0..=Self::MAX_DIGITS)
            .find(|&d| 10u64.pow(u32::from(d)) == scale)
            .map(Self)
            .ok_or_else(|| {
                FieldError::validation(format!(
                    "timestamp scale {scale} is not a power of ten up to 1000000"
                ))
            })
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Units per second at this resolution.
    #[must_use]
    pub const fn scale(self) -> i64 {
        10i64.pow(self.0 as u32)
    }

    // Microseconds per retained unit.
    const fn step_micros(self) -> u32 {
        10u32.pow((Self::MAX_DIGITS - self.0) as u32)
    }

    /// Drop sub-resolution digits from a microsecond component.
    #[must_use]
    pub const fn truncate_micros(self, micros: u32) -> u32 {
        micros - micros % self.step_micros()
    }
}

///
/// TimestampSpec
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TimestampSpec {
    pub resolution: TimestampResolution,
    /// Convert aware inputs to UTC before truncation; otherwise their
    /// wall-clock reading is kept.
    pub utc: bool,
}

impl TimestampSpec {
    #[must_use]
    pub const fn new(resolution: TimestampResolution) -> Self {
        Self {
            resolution,
            utc: false,
        }
    }

    #[must_use]
    pub const fn utc(mut self) -> Self {
        self.utc = true;
        self
    }

    fn truncate(&self, dt: NaiveDateTime) -> Result<NaiveDateTime, FieldError> {
        let micros = dt.nanosecond() / 1_000;
        let kept = self.resolution.truncate_micros(micros);

        dt.with_nanosecond(kept * 1_000)
            .ok_or_else(|| FieldError::validation(format!("cannot truncate {dt}")))
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn from_epoch_float(secs: f64) -> Result<NaiveDateTime, FieldError> {
    if !secs.is_finite() {
        return Err(FieldError::validation("epoch seconds must be finite"));
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;

    DateTime::from_timestamp(whole as i64, nanos)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| FieldError::validation(format!("epoch {secs} is out of range")))
}

pub(super) fn coerce_timestamp(spec: &TimestampSpec, input: Value) -> Result<Value, FieldError> {
    let naive = match input {
        Value::DateTime(dt) => dt,
        Value::DateTimeTz(dt) if spec.utc => dt.naive_utc(),
        Value::DateTimeTz(dt) => dt.naive_local(),
        Value::Date(d) => at_midnight(d),
        Value::Int(secs) => DateTime::from_timestamp(secs, 0)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| FieldError::validation(format!("epoch {secs} is out of range")))?,
        Value::Float(secs) => from_epoch_float(secs)?,
        other => return Err(FieldError::unexpected_value("datetime", &other)),
    };

    spec.truncate(naive).map(Value::DateTime)
}

pub(super) fn encode_timestamp(spec: &TimestampSpec, value: &Value) -> Result<Wire, FieldError> {
    let Value::DateTime(dt) = value else {
        return Err(FieldError::unexpected_value("datetime", value));
    };

    let resolution = spec.resolution;
    let secs = dt.and_utc().timestamp();
    let micros = resolution.truncate_micros(dt.nanosecond() / 1_000);
    let fraction = i64::from(micros / resolution.step_micros());

    secs.checked_mul(resolution.scale())
        .and_then(|scaled| scaled.checked_add(fraction))
        .map(Wire::Int)
        .ok_or_else(|| FieldError::validation(format!("{dt} overflows the timestamp range")))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(super) fn decode_timestamp(spec: &TimestampSpec, wire: Wire) -> Result<Value, FieldError> {
    let resolution = spec.resolution;
    let stored = match wire {
        Wire::Int(v) => v,
        Wire::Float(f) => {
            let secs = f / resolution.scale() as f64;
            return spec.truncate(from_epoch_float(secs)?).map(Value::DateTime);
        }
        other => return Err(FieldError::unexpected_wire("timestamp", &other)),
    };

    let scale = resolution.scale();
    let secs = stored.div_euclid(scale);
    // rem_euclid is in 0..scale, which fits u32 for scale <= 10^6
    let micros = stored.rem_euclid(scale) as u32 * resolution.step_micros();

    DateTime::from_timestamp(secs, micros * 1_000)
        .map(|dt| Value::DateTime(dt.naive_utc()))
        .ok_or_else(|| FieldError::validation(format!("stored timestamp {stored} is out of range")))
}
