//! Value types that back field kinds: enumerations, struct payloads, and
//! the short UUID text form.

mod enumeration;
pub mod short_uuid;
mod structure;

pub use enumeration::{EnumDef, EnumDefBuilder, EnumLiteral, EnumMember};
pub use structure::{FnStructCodec, SerdeStructCodec, StructCodec, StructObject, StructValue};
