//! ## Crate layout
//! - `core`: values, field coercion, models and records, storage-key
//!   indexes, the serializer registry, and the backend seam.
//! - `logging`: opt-in `tracing` subscriber setup for binaries and tests.
//!
//! The `prelude` module carries what model-declaring code needs day to day.

pub use cachemodel_core as core;

pub mod logging;

#[cfg(test)]
mod tests;

/// re-exports
///
/// value constructors name these types directly, so callers don't need to
/// pin matching versions in their own Cargo.toml
pub mod __reexports {
    pub use chrono;
    pub use rust_decimal;
    pub use serde_json;
    pub use uuid;
}

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use core::{Error, ErrorClass, ErrorOrigin};
pub use logging::{LoggingError, init_logging};

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::{
        db::{Backend, MemoryBackend, ModelStore},
        field::{DecimalSpec, FieldDescriptor, FieldKind, TimestampResolution, TimestampSpec},
        index::IndexFormatter,
        model::{CompositeKey, Model, ModelConfig, PrimaryKey, Record},
        serialize::{Serializer, SerializerRegistry},
        types::{EnumDef, StructValue},
        value::Value,
    };
}
