use crate::{
    db::BackendError,
    field::{FieldError, FieldErrorKind},
    index::IndexError,
    model::{ConfigError, ModelError},
    serialize::{SerializeError, SerializeErrorKind},
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Structured runtime error with a stable classification.
/// Every subsystem error converts into this type at the crate boundary.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message}")]
pub struct Error {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a store-origin not-found error for one storage key.
    pub fn store_not_found(key: impl AsRef<str>) -> Self {
        Self::new(
            ErrorClass::NotFound,
            ErrorOrigin::Store,
            format!("cache key not found: {}", key.as_ref()),
        )
    }

    /// Construct a serialize-origin corruption error.
    pub(crate) fn serialize_corruption(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::Corruption,
            ErrorOrigin::Serialize,
            message.into(),
        )
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound)
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.class, ErrorClass::Validation)
    }

    #[must_use]
    pub const fn is_type(&self) -> bool {
        matches!(self.class, ErrorClass::Type)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

impl From<FieldError> for Error {
    fn from(err: FieldError) -> Self {
        let class = match err.kind {
            FieldErrorKind::Validation => ErrorClass::Validation,
            FieldErrorKind::Type => ErrorClass::Type,
        };

        Self::new(class, ErrorOrigin::Field, err.to_string())
    }
}

impl From<IndexError> for Error {
    fn from(err: IndexError) -> Self {
        Self::new(ErrorClass::Validation, ErrorOrigin::Index, err.to_string())
    }
}

impl From<ModelError> for Error {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Field(inner) => inner.into(),
            ModelError::Index(inner) => inner.into(),
            payload @ ModelError::MalformedPayload { .. } => {
                Self::serialize_corruption(payload.to_string())
            }
            ModelError::Config(inner) => inner.into(),
            other => Self::new(ErrorClass::Validation, ErrorOrigin::Model, other.to_string()),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorClass::Validation, ErrorOrigin::Config, err.to_string())
    }
}

impl From<SerializeError> for Error {
    fn from(err: SerializeError) -> Self {
        let class = match err.kind() {
            SerializeErrorKind::Type => ErrorClass::Type,
            SerializeErrorKind::Serialize => ErrorClass::Internal,
            SerializeErrorKind::Deserialize | SerializeErrorKind::DeserializeSizeLimitExceeded => {
                ErrorClass::Corruption
            }
            SerializeErrorKind::AlreadyExists => ErrorClass::AlreadyExists,
            SerializeErrorKind::NotFound => ErrorClass::NotFound,
            SerializeErrorKind::MissingCapability => ErrorClass::MissingCapability,
        };

        Self::new(class, ErrorOrigin::Serialize, err.to_string())
    }
}

impl From<BackendError> for Error {
    fn from(err: BackendError) -> Self {
        Self::new(ErrorClass::Unavailable, ErrorOrigin::Store, err.to_string())
    }
}

///
/// ErrorClass
/// Error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorClass {
    /// Input could not be parsed or violates a declared constraint.
    Validation,
    /// Input has a fundamentally wrong shape.
    Type,
    NotFound,
    AlreadyExists,
    /// An optional codec backend is not compiled in.
    MissingCapability,
    Corruption,
    Unavailable,
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Validation => "validation",
            Self::Type => "type",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::MissingCapability => "missing_capability",
            Self::Corruption => "corruption",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorOrigin {
    Config,
    Field,
    Index,
    Model,
    Serialize,
    Store,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Config => "config",
            Self::Field => "field",
            Self::Index => "index",
            Self::Model => "model",
            Self::Serialize => "serialize",
            Self::Store => "store",
        };
        write!(f, "{label}")
    }
}
