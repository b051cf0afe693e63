use crate::{field::FieldError, value::Wire};
use serde::{Serialize, de::DeserializeOwned};
use std::{any::Any, fmt, marker::PhantomData, sync::Arc};

///
/// StructObject
///
/// Object-safe view of an arbitrary native value stored in a struct field.
/// Implemented for every `Debug + PartialEq` type, so callers never write it.
///

pub trait StructObject: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn dyn_eq(&self, other: &dyn StructObject) -> bool;
}

impl<T> StructObject for T
where
    T: Any + fmt::Debug + PartialEq + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn StructObject) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

///
/// StructValue
///
/// Shared handle to a native value owned by a struct field.
///

#[derive(Clone)]
pub struct StructValue(Arc<dyn StructObject>);

impl StructValue {
    pub fn new<T: StructObject>(value: T) -> Self {
        Self(Arc::new(value))
    }

    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.0.as_ref().as_any().is::<T>()
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_ref().as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for StructValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0.as_ref(), f)
    }
}

impl PartialEq for StructValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_ref().dyn_eq(other.0.as_ref())
    }
}

///
/// StructCodec
///
/// Encode/decode capability bound into a struct field. The engine stores
/// only the intermediate returned by `encode`.
///

pub trait StructCodec: fmt::Debug + Send + Sync {
    /// Whether the value is of the type this codec handles.
    fn accepts(&self, value: &StructValue) -> bool;

    fn encode(&self, value: &StructValue) -> Result<Wire, FieldError>;

    fn decode(&self, wire: &Wire) -> Result<StructValue, FieldError>;
}

type EncodeFn<T> = dyn Fn(&T) -> Wire + Send + Sync;
type DecodeFn<T> = dyn Fn(&Wire) -> Result<T, FieldError> + Send + Sync;

///
/// FnStructCodec
///
/// Struct codec built from a caller-supplied encode/decode function pair.
///

pub struct FnStructCodec<T> {
    encode: Box<EncodeFn<T>>,
    decode: Box<DecodeFn<T>>,
}

impl<T: StructObject> FnStructCodec<T> {
    pub fn new<E, D>(encode: E, decode: D) -> Self
    where
        E: Fn(&T) -> Wire + Send + Sync + 'static,
        D: Fn(&Wire) -> Result<T, FieldError> + Send + Sync + 'static,
    {
        Self {
            encode: Box::new(encode),
            decode: Box::new(decode),
        }
    }
}

impl<T> fmt::Debug for FnStructCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStructCodec")
            .field("type", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<T: StructObject> StructCodec for FnStructCodec<T> {
    fn accepts(&self, value: &StructValue) -> bool {
        value.is::<T>()
    }

    fn encode(&self, value: &StructValue) -> Result<Wire, FieldError> {
        let inner = value.downcast_ref::<T>().ok_or_else(|| {
            FieldError::type_mismatch(format!(
                "expected struct of type {}",
                std::any::type_name::<T>()
            ))
        })?;

        Ok((self.encode)(inner))
    }

    fn decode(&self, wire: &Wire) -> Result<StructValue, FieldError> {
        (self.decode)(wire).map(StructValue::new)
    }
}

///
/// SerdeStructCodec
///
/// Struct codec for any serde type, lowered through its JSON data model.
///

pub struct SerdeStructCodec<T>(PhantomData<fn() -> T>);

impl<T> SerdeStructCodec<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for SerdeStructCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SerdeStructCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SerdeStructCodec<{}>", std::any::type_name::<T>())
    }
}

impl<T> StructCodec for SerdeStructCodec<T>
where
    T: StructObject + Serialize + DeserializeOwned,
{
    fn accepts(&self, value: &StructValue) -> bool {
        value.is::<T>()
    }

    fn encode(&self, value: &StructValue) -> Result<Wire, FieldError> {
        let inner = value.downcast_ref::<T>().ok_or_else(|| {
            FieldError::type_mismatch(format!(
                "expected struct of type {}",
                std::any::type_name::<T>()
            ))
        })?;
        let json = serde_json::to_value(inner).map_err(|e| FieldError::validation(e.to_string()))?;

        Ok(Wire::from_json(json))
    }

    fn decode(&self, wire: &Wire) -> Result<StructValue, FieldError> {
        let json = wire
            .to_json()
            .map_err(|e| FieldError::validation(e.to_string()))?;
        let inner: T =
            serde_json::from_value(json).map_err(|e| FieldError::validation(e.to_string()))?;

        Ok(StructValue::new(inner))
    }
}
