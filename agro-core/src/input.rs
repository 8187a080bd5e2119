//! Form state and the coercion layer every calculator runs its inputs through.
//!
//! A calculator page holds its fields as a [`FormInputs`] map of
//! [`InputValue`]s. Nothing downstream ever sees raw text: the formula engine
//! asks for [`FormInputs::number`], which coerces the stored value to a finite
//! [`Decimal`] and falls back to zero for anything empty or unparseable.
//!
//! Numbers are serialized as exact JSON number literals (serde_json is built
//! with `arbitrary_precision`), so a snapshot written to a store reads back
//! equal to what was written.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A single form cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputValue {
    Number(Decimal),
    /// Categorical or free text, kept verbatim.
    Text(String),
    #[default]
    Empty,
}

impl InputValue {
    /// Interprets raw form text: blank is [`InputValue::Empty`], a numeric
    /// literal is [`InputValue::Number`], anything else is kept as text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        match parse_number(trimmed) {
            Some(n) => Self::Number(n),
            None => Self::Text(raw.to_string()),
        }
    }

    /// Coerces the cell to a finite number, `0` when empty or invalid.
    pub fn coerce(&self) -> Decimal {
        match self {
            Self::Number(n) => *n,
            Self::Text(s) => coerce_text(s),
            Self::Empty => Decimal::ZERO,
        }
    }

    /// Text view of the cell, used for categorical fields and names.
    pub fn as_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::Empty => String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<Decimal> for InputValue {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl fmt::Display for InputValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Empty => f.write_str("—"),
        }
    }
}

impl Serialize for InputValue {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serialize_decimal(n, serializer),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Empty => serializer.serialize_str(""),
        }
    }
}

impl<'de> Deserialize<'de> for InputValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => Ok(decimal_from_json(&n)
                .map(Self::Number)
                .unwrap_or_else(|| Self::Text(n.to_string()))),
            Value::String(s) if s.is_empty() => Ok(Self::Empty),
            Value::String(s) => Ok(Self::Text(s)),
            Value::Bool(b) => Ok(Self::Number(if b { Decimal::ONE } else { Decimal::ZERO })),
            Value::Null => Ok(Self::Empty),
            other => Err(D::Error::custom(format!("unsupported input value: {other}"))),
        }
    }
}

/// Coerces free text the way a numeric form field reads it.
///
/// Blank text is `0`. Decimal, scientific and `0x`/`0o`/`0b` literals are
/// accepted; everything else, including non-finite values, is `0`.
pub fn coerce_text(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }
    parse_number(trimmed).unwrap_or(Decimal::ZERO)
}

fn parse_number(s: &str) -> Option<Decimal> {
    if let Some(n) = parse_radix_literal(s) {
        return Some(n);
    }
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
        .or_else(|| {
            s.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .and_then(|f| Decimal::try_from(f).ok())
        })
}

fn parse_radix_literal(s: &str) -> Option<Decimal> {
    let radix = match s.get(..2)? {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    u64::from_str_radix(&s[2..], radix).ok().map(Decimal::from)
}

fn serialize_decimal<S: Serializer>(
    value: &Decimal,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let number = serde_json::Number::from_str(&value.normalize().to_string())
        .map_err(serde::ser::Error::custom)?;
    number.serialize(serializer)
}

fn decimal_from_json(number: &serde_json::Number) -> Option<Decimal> {
    let literal = number.to_string();
    Decimal::from_str(&literal)
        .ok()
        .or_else(|| Decimal::from_scientific(&literal).ok())
}

/// Default a field takes when a form is opened or a stored snapshot lacks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Empty,
    Text(&'static str),
}

impl FieldDefault {
    pub fn to_value(self) -> InputValue {
        match self {
            Self::Empty => InputValue::Empty,
            Self::Text(s) => InputValue::Text(s.to_string()),
        }
    }
}

/// Declares one input field of a calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub default: FieldDefault,
}

impl FieldSpec {
    /// A numeric field, blank until the user types.
    pub const fn number(key: &'static str) -> Self {
        Self {
            key,
            default: FieldDefault::Empty,
        }
    }

    /// A categorical field with a preselected option.
    pub const fn choice(
        key: &'static str,
        default: &'static str,
    ) -> Self {
        Self {
            key,
            default: FieldDefault::Text(default),
        }
    }
}

/// The full input state of one calculator page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormInputs(BTreeMap<String, InputValue>);

impl FormInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// A form with every declared field at its default.
    pub fn from_defaults(fields: &[FieldSpec]) -> Self {
        let mut inputs = Self::new();
        inputs.fill_defaults(fields);
        inputs
    }

    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<InputValue>,
    ) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(
        mut self,
        key: impl Into<String>,
        value: impl Into<InputValue>,
    ) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&InputValue> {
        self.0.get(key)
    }

    /// Coerced numeric value of `key`; missing fields read as `0`.
    pub fn number(
        &self,
        key: &str,
    ) -> Decimal {
        self.0.get(key).map_or(Decimal::ZERO, InputValue::coerce)
    }

    /// Text value of `key`; missing fields read as the empty string.
    pub fn text(
        &self,
        key: &str,
    ) -> String {
        self.0.get(key).map(InputValue::as_text).unwrap_or_default()
    }

    /// Inserts the default of every declared field that is absent.
    /// Returns how many fields were filled.
    pub fn fill_defaults(
        &mut self,
        fields: &[FieldSpec],
    ) -> usize {
        let mut filled = 0;
        for field in fields {
            if !self.0.contains_key(field.key) {
                self.0.insert(field.key.to_string(), field.default.to_value());
                filled += 1;
            }
        }
        filled
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &InputValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A single computed output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultValue {
    Number(Decimal),
    Text(String),
}

impl ResultValue {
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

impl From<Decimal> for ResultValue {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ResultValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ResultValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for ResultValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for ResultValue {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serialize_decimal(n, serializer),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for ResultValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => decimal_from_json(&n)
                .map(Self::Number)
                .ok_or_else(|| D::Error::custom(format!("result out of range: {n}"))),
            Value::String(s) => Ok(Self::Text(s)),
            other => Err(D::Error::custom(format!("unsupported result value: {other}"))),
        }
    }
}

/// The output record of a formula engine run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet(BTreeMap<String, ResultValue>);

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ResultValue>,
    ) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&ResultValue> {
        self.0.get(key)
    }

    pub fn number(
        &self,
        key: &str,
    ) -> Option<Decimal> {
        self.0.get(key).and_then(ResultValue::as_number)
    }

    pub fn text(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.0.get(key).and_then(ResultValue::as_text)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResultValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
