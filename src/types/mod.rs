// src/types/mod.rs

pub mod common;
pub mod date;
pub mod geopoint;
pub mod value;

pub use common::{ParseBytes, ParseRelation, Pointer, RelationOp};
pub use date::ParseDate;
pub use geopoint::ParseGeoPoint;
pub use value::ParseValue;
