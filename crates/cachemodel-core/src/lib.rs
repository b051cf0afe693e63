//! Core runtime for cachemodel: values, field coercion, model metadata,
//! storage-key indexes, the serializer registry, and the backend seam.

// public exports are one module level down
pub mod db;
pub mod error;
pub mod field;
pub mod index;
pub mod model;
pub mod serialize;
pub mod types;
pub mod value;

///
/// CONSTANTS
///

/// Maximum payload size accepted by bounded decoders.
///
/// Cache values larger than this are treated as corrupt rather than
/// materialized.
pub const MAX_PAYLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Prefix of every storage key produced by the default key template.
pub const DEFAULT_KEY_PREFIX: &str = "m";

// re-exports
pub use error::{Error, ErrorClass, ErrorOrigin};

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No executors, backends, or codecs are re-exported here.
///

pub mod prelude {
    pub use crate::{
        field::{FieldDescriptor, FieldKind},
        index::IndexFormatter,
        model::{CompositeKey, Model, PrimaryKey, Record},
        value::{Value, Wire},
    };
}
