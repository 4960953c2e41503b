pub mod client;
pub mod config;
pub mod error;
pub mod file;
pub mod object;
pub mod profile;
pub mod push;
pub mod query;
pub mod relations;
pub mod requests;
pub mod schema;
pub mod server;
pub mod types;
pub mod wire;

pub use client::ParseClient;
pub use config::ClientConfig;
pub use error::{ErrorCategory, ParseError};
pub use file::{FileField, ParseFile};
pub use object::ParseObject;
pub use profile::{ProfileStore, SavedQuery, ServerProfile};
pub use push::{PushData, PushNotification};
pub use query::ParseQuery;
pub use schema::{FieldSchema, FieldType, ParseSchema};
pub use server::ServerInfo;
pub use wire::DisplayValue;

pub use types::{ParseDate, ParseGeoPoint, ParseRelation, ParseValue, Pointer};
