// src/types/value.rs

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use super::{ParseBytes, ParseDate, ParseGeoPoint, ParseRelation, Pointer};
use crate::file::FileField;

/// A JSON value from a Parse response, classified by its `__type` tag or, for
/// untagged values, by its JSON shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(Map<String, Value>),
    Pointer(Pointer),
    File(FileField),
    Date(ParseDate),
    Relation(ParseRelation),
    GeoPoint(ParseGeoPoint),
    Bytes(ParseBytes),
    /// Carries a `__type` tag that is unknown or whose fields don't match the tag.
    Unrecognized(Value),
}

impl ParseValue {
    pub fn classify(value: &Value) -> Self {
        match value {
            Value::Null => ParseValue::Null,
            Value::Bool(b) => ParseValue::Bool(*b),
            Value::Number(n) => ParseValue::Number(n.clone()),
            Value::String(s) => ParseValue::String(s.clone()),
            Value::Array(items) => ParseValue::Array(items.clone()),
            Value::Object(map) => match map.get("__type").and_then(Value::as_str) {
                None => ParseValue::Object(map.clone()),
                Some("Pointer") => typed(value, ParseValue::Pointer),
                Some("File") => typed(value, ParseValue::File),
                Some("Date") => typed(value, ParseValue::Date),
                Some("Relation") => typed(value, ParseValue::Relation),
                Some("GeoPoint") => typed(value, ParseValue::GeoPoint),
                Some("Bytes") => typed(value, ParseValue::Bytes),
                Some(_) => ParseValue::Unrecognized(value.clone()),
            },
        }
    }

    /// The `__type` tag, or the JSON shape name for untagged values.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParseValue::Null => "Null",
            ParseValue::Bool(_) => "Boolean",
            ParseValue::Number(_) => "Number",
            ParseValue::String(_) => "String",
            ParseValue::Array(_) => "Array",
            ParseValue::Object(_) => "Object",
            ParseValue::Pointer(_) => "Pointer",
            ParseValue::File(_) => "File",
            ParseValue::Date(_) => "Date",
            ParseValue::Relation(_) => "Relation",
            ParseValue::GeoPoint(_) => "GeoPoint",
            ParseValue::Bytes(_) => "Bytes",
            ParseValue::Unrecognized(_) => "Unrecognized",
        }
    }
}

fn typed<T: DeserializeOwned>(value: &Value, wrap: fn(T) -> ParseValue) -> ParseValue {
    match serde_json::from_value::<T>(value.clone()) {
        Ok(inner) => wrap(inner),
        Err(e) => {
            log::debug!("Tagged value did not match its __type ({}): {}", e, value);
            ParseValue::Unrecognized(value.clone())
        }
    }
}
