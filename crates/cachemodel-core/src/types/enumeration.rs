use crate::{field::FieldError, value::Value, value::Wire};
use std::{
    collections::HashMap,
    fmt::{self, Display},
    hash::{Hash, Hasher},
    sync::Arc,
};

///
/// EnumLiteral
///
/// Literal value carried by one enum member.
///
/// Floats with no fractional part compare and hash as the equivalent
/// integer, so `1` and `1.0` select the same member.
///

#[derive(Clone, Debug)]
pub enum EnumLiteral {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl EnumLiteral {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::float_cmp
    )]
    fn normalized(&self) -> Self {
        match self {
            Self::Float(f) if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 => {
                Self::Int(*f as i64)
            }
            other => other.clone(),
        }
    }

    /// Literal lifted from an assignment input, if the input is literal-shaped.
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(Self::Bool(*v)),
            Value::Int(v) => Some(Self::Int(*v)),
            Value::Float(v) => Some(Self::Float(*v)),
            Value::Text(v) => Some(Self::Text(v.clone())),
            _ => None,
        }
    }

    pub(crate) fn from_wire(wire: &Wire) -> Option<Self> {
        match wire {
            Wire::Bool(v) => Some(Self::Bool(*v)),
            Wire::Int(v) => Some(Self::Int(*v)),
            Wire::Float(v) => Some(Self::Float(*v)),
            Wire::Text(v) => Some(Self::Text(v.clone())),
            _ => None,
        }
    }

    pub(crate) fn to_wire(&self) -> Wire {
        match self {
            Self::Bool(v) => Wire::Bool(*v),
            Self::Int(v) => Wire::Int(*v),
            Self::Float(v) => Wire::Float(*v),
            Self::Text(v) => Wire::Text(v.clone()),
        }
    }
}

impl PartialEq for EnumLiteral {
    fn eq(&self, other: &Self) -> bool {
        match (self.normalized(), other.normalized()) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for EnumLiteral {}

impl Hash for EnumLiteral {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.normalized() {
            Self::Bool(v) => (0u8, v).hash(state),
            Self::Int(v) => (1u8, v).hash(state),
            Self::Float(v) => (2u8, v.to_bits()).hash(state),
            Self::Text(v) => (3u8, v).hash(state),
        }
    }
}

impl Display for EnumLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for EnumLiteral {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for EnumLiteral {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for EnumLiteral {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for EnumLiteral {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for EnumLiteral {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for EnumLiteral {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

///
/// EnumMember
///
/// Canonical value of an enum field. Identity is (enum name, member name);
/// the literal is carried for encoding and key formatting.
///

#[derive(Clone, Debug)]
pub struct EnumMember {
    enum_name: Arc<str>,
    name: Arc<str>,
    value: EnumLiteral,
}

impl EnumMember {
    #[must_use]
    pub fn enum_name(&self) -> &str {
        &self.enum_name
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn value(&self) -> &EnumLiteral {
        &self.value
    }
}

impl PartialEq for EnumMember {
    fn eq(&self, other: &Self) -> bool {
        self.enum_name == other.enum_name && self.name == other.name
    }
}

impl Eq for EnumMember {}

///
/// EnumDef
///
/// Declared enumeration plus the literal → member lookup table built once
/// at declaration time. Later members whose literal repeats an earlier one
/// become aliases of the earlier member.
///

#[derive(Debug)]
pub struct EnumDef {
    name: Arc<str>,
    members: Vec<EnumMember>,
    by_name: HashMap<Arc<str>, usize>,
    by_literal: HashMap<EnumLiteral, usize>,
}

impl EnumDef {
    #[must_use]
    pub fn builder(name: impl Into<String>) -> EnumDefBuilder {
        EnumDefBuilder {
            name: name.into(),
            members: Vec::new(),
            aliases: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }

    /// Member by declared name.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<EnumMember> {
        self.by_name.get(name).map(|&i| self.members[i].clone())
    }

    /// Resolve an assignment input to a member.
    ///
    /// Accepts a member of this enum, or any literal present in the table.
    #[must_use]
    pub fn lookup(&self, value: &Value) -> Option<EnumMember> {
        match value {
            Value::Enum(member) => (member.enum_name == self.name)
                .then(|| self.member(&member.name))
                .flatten(),
            other => EnumLiteral::from_value(other).and_then(|lit| self.lookup_literal(&lit)),
        }
    }

    #[must_use]
    pub fn lookup_literal(&self, literal: &EnumLiteral) -> Option<EnumMember> {
        self.by_literal
            .get(literal)
            .map(|&i| self.members[i].clone())
    }
}

///
/// EnumDefBuilder
///

#[derive(Debug)]
pub struct EnumDefBuilder {
    name: String,
    members: Vec<(String, EnumLiteral)>,
    aliases: Vec<(EnumLiteral, String)>,
}

impl EnumDefBuilder {
    #[must_use]
    pub fn member(mut self, name: impl Into<String>, value: impl Into<EnumLiteral>) -> Self {
        self.members.push((name.into(), value.into()));
        self
    }

    /// Accept an extra literal for an existing member.
    #[must_use]
    pub fn alias(mut self, literal: impl Into<EnumLiteral>, member: impl Into<String>) -> Self {
        self.aliases.push((literal.into(), member.into()));
        self
    }

    pub fn build(self) -> Result<Arc<EnumDef>, FieldError> {
        let enum_name: Arc<str> = Arc::from(self.name.as_str());
        if self.members.is_empty() {
            return Err(FieldError::validation(format!(
                "enum '{enum_name}' declares no members"
            )));
        }

        let mut members = Vec::with_capacity(self.members.len());
        let mut by_name = HashMap::new();
        let mut by_literal = HashMap::new();

        for (name, value) in self.members {
            let name: Arc<str> = Arc::from(name.as_str());
            if by_name.contains_key(&name) {
                return Err(FieldError::validation(format!(
                    "enum '{enum_name}' declares member '{name}' more than once"
                )));
            }

            let index = members.len();
            by_name.insert(name.clone(), index);
            by_literal.entry(value.clone()).or_insert(index);
            members.push(EnumMember {
                enum_name: enum_name.clone(),
                name,
                value,
            });
        }

        for (literal, target) in self.aliases {
            let Some(&index) = by_name.get(target.as_str()) else {
                return Err(FieldError::validation(format!(
                    "enum '{enum_name}' alias '{literal}' targets unknown member '{target}'"
                )));
            };
            if by_literal.get(&literal).is_some_and(|&existing| existing != index) {
                return Err(FieldError::validation(format!(
                    "enum '{enum_name}' alias '{literal}' is already bound to another member"
                )));
            }
            by_literal.insert(literal, index);
        }

        Ok(Arc::new(EnumDef {
            name: enum_name,
            members,
            by_name,
            by_literal,
        }))
    }
}
