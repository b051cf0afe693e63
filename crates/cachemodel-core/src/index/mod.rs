//! Storage-key derivation.
//!
//! An [`Index`] binds an [`IndexFormatter`] to an ordered list of key
//! fields. Every model owns an [`IndexManager`] whose first entry is the
//! primary-key index.

#[cfg(test)]
mod tests;

use crate::{DEFAULT_KEY_PREFIX, field::FieldDescriptor, value::Value};
use derive_more::Deref;
use std::{fmt, sync::Arc};
use thiserror::Error as ThisError;

///
/// IndexError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum IndexError {
    #[error("index on model '{model}' has no key fields")]
    Empty { model: String },

    #[error("key template expects {expected} value(s), got {found}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("invalid key template '{template}': {message}")]
    InvalidTemplate { template: String, message: String },
}

///
/// KeyTemplate
///
/// Parsed `%s` template. `%s` takes the next value's key-string form and
/// `%%` is a literal `%`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyTemplate {
    source: String,
    segments: Vec<Segment>,
    placeholders: usize,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Segment {
    Literal(String),
    Slot,
}

impl KeyTemplate {
    pub fn parse(source: impl Into<String>) -> Result<Self, IndexError> {
        let source = source.into();
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            match chars.next() {
                Some('%') => literal.push('%'),
                Some('s') => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot);
                }
                other => {
                    return Err(IndexError::InvalidTemplate {
                        message: match other {
                            Some(c) => format!("unsupported directive '%{c}'"),
                            None => "trailing '%'".to_string(),
                        },
                        template: source,
                    });
                }
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let placeholders = segments.iter().filter(|s| matches!(s, Segment::Slot)).count();

        Ok(Self {
            source,
            segments,
            placeholders,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub const fn placeholders(&self) -> usize {
        self.placeholders
    }

    fn render(&self, values: &[Value]) -> Result<String, IndexError> {
        if values.len() != self.placeholders {
            return Err(IndexError::ArityMismatch {
                expected: self.placeholders,
                found: values.len(),
            });
        }

        let mut out = String::with_capacity(self.source.len() + values.len() * 8);
        let mut values = values.iter();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot => {
                    if let Some(value) = values.next() {
                        out.push_str(&value.to_string());
                    }
                }
            }
        }

        Ok(out)
    }
}

/// Key function over the ordered key values.
pub type KeyFn = Arc<dyn Fn(&[Value]) -> String + Send + Sync>;

///
/// IndexFormatter
///
/// Pure function from ordered key values to a storage key.
///

#[derive(Clone)]
pub enum IndexFormatter {
    Template(KeyTemplate),
    Callable(KeyFn),
}

impl IndexFormatter {
    /// `m:<model>:<field1>:%s[:<field2>:%s...]`
    pub fn from_default<'a>(
        model: &str,
        fields: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, IndexError> {
        let mut template = format!("{DEFAULT_KEY_PREFIX}:{}", escape(model));
        for field in fields {
            template.push(':');
            template.push_str(&escape(field));
            template.push_str(":%s");
        }

        Self::from_string_format(template)
    }

    pub fn from_string_format(template: impl Into<String>) -> Result<Self, IndexError> {
        KeyTemplate::parse(template).map(Self::Template)
    }

    pub fn from_callable<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> String + Send + Sync + 'static,
    {
        Self::Callable(Arc::new(f))
    }

    /// Number of values a template consumes; callables accept any arity.
    #[must_use]
    pub const fn arity(&self) -> Option<usize> {
        match self {
            Self::Template(t) => Some(t.placeholders()),
            Self::Callable(_) => None,
        }
    }

    pub fn format(&self, values: &[Value]) -> Result<String, IndexError> {
        match self {
            Self::Template(t) => t.render(values),
            Self::Callable(f) => Ok(f(values)),
        }
    }
}

// names are literal text inside a template
fn escape(name: &str) -> String {
    name.replace('%', "%%")
}

impl fmt::Debug for IndexFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(t) => f.debug_tuple("Template").field(&t.as_str()).finish(),
            Self::Callable(_) => f.write_str("Callable(..)"),
        }
    }
}

///
/// Index
///

#[derive(Clone, Debug)]
pub struct Index {
    model: String,
    fields: Vec<FieldDescriptor>,
    formatter: IndexFormatter,
}

impl Index {
    /// Bind `fields` to `formatter`, or to the default template when none
    /// is given. Template arity must match the field count.
    pub fn new(
        model: impl Into<String>,
        fields: Vec<FieldDescriptor>,
        formatter: Option<IndexFormatter>,
    ) -> Result<Self, IndexError> {
        let model = model.into();
        if fields.is_empty() {
            return Err(IndexError::Empty { model });
        }

        let formatter = match formatter {
            Some(formatter) => formatter,
            None => IndexFormatter::from_default(&model, fields.iter().map(FieldDescriptor::name))?,
        };
        match formatter.arity() {
            Some(expected) if expected != fields.len() => {
                return Err(IndexError::ArityMismatch {
                    expected,
                    found: fields.len(),
                });
            }
            _ => {}
        }

        Ok(Self {
            model,
            fields,
            formatter,
        })
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(FieldDescriptor::name)
    }

    #[must_use]
    pub const fn formatter(&self) -> &IndexFormatter {
        &self.formatter
    }

    /// Whether `name` is one of this index's key fields.
    #[must_use]
    pub fn covers(&self, name: &str) -> bool {
        self.field_names().any(|n| n == name)
    }

    /// Format already-canonical key values, in key-field order.
    pub fn key_for(&self, values: &[Value]) -> Result<String, IndexError> {
        if values.len() != self.fields.len() {
            return Err(IndexError::ArityMismatch {
                expected: self.fields.len(),
                found: values.len(),
            });
        }

        self.formatter.format(values)
    }
}

///
/// PrimaryKeyIndex
///
/// The index over a model's primary-key field(s).
///

#[derive(Clone, Debug, Deref)]
pub struct PrimaryKeyIndex(Index);

impl PrimaryKeyIndex {
    pub fn new(
        model: impl Into<String>,
        key_fields: Vec<FieldDescriptor>,
        formatter: Option<IndexFormatter>,
    ) -> Result<Self, IndexError> {
        Index::new(model, key_fields, formatter).map(Self)
    }
}

///
/// IndexManager
///
/// Per-model index set, generated once at model build. Index 0 is always
/// the primary-key index.
///

#[derive(Clone, Debug)]
pub struct IndexManager {
    primary: PrimaryKeyIndex,
    indexes: Vec<Index>,
}

impl IndexManager {
    pub fn generate_indexes(
        model: &str,
        key_fields: Vec<FieldDescriptor>,
        formatter: Option<IndexFormatter>,
    ) -> Result<Self, IndexError> {
        let primary = PrimaryKeyIndex::new(model, key_fields, formatter)?;
        let indexes = vec![(*primary).clone()];

        Ok(Self { primary, indexes })
    }

    #[must_use]
    pub const fn primary_key_index(&self) -> &PrimaryKeyIndex {
        &self.primary
    }

    #[must_use]
    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }
}
