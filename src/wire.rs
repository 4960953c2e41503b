// src/wire.rs

//! Translation between Parse Server's typed JSON values and what an
//! administrator reads and types.
//!
//! [`decode`] never fails: values whose shape doesn't match the declared
//! field type fall back to their raw JSON. [`encode`] only checks that input
//! is present; anything it can't interpret is passed through and left for
//! the server to reject.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Number, Value};
use std::fmt;

use crate::error::ParseError;
use crate::schema::{FieldSchema, FieldType};
use crate::types::date::parse_iso;
use crate::types::{ParseDate, ParseGeoPoint, ParseValue, Pointer, RelationOp};

/// What a field looks like once rendered for a person.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayValue {
    /// Missing or `null`.
    Undefined,
    Text(String),
    Number(Number),
    Bool(bool),
    Date(DateTime<Utc>),
    Pointer {
        class_name: String,
        object_id: String,
    },
    File {
        name: String,
        url: Option<String>,
    },
    /// A relation column; its members are fetched with a `$relatedTo` query.
    Relation {
        class_name: String,
    },
    GeoPoint {
        latitude: f64,
        longitude: f64,
    },
    /// Number of elements in an array.
    Elements(usize),
    /// Number of keys in an object (including ACLs).
    Keys(usize),
    /// Anything we could not interpret, shown as compact JSON.
    Raw(String),
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Undefined => f.write_str("undefined"),
            DisplayValue::Text(text) => f.write_str(text),
            DisplayValue::Number(n) => write!(f, "{}", n),
            DisplayValue::Bool(true) => f.write_str("True"),
            DisplayValue::Bool(false) => f.write_str("False"),
            DisplayValue::Date(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S UTC")),
            DisplayValue::Pointer {
                class_name,
                object_id,
            } => write!(f, "{} {}", class_name, object_id),
            DisplayValue::File { name, url: Some(url) } => write!(f, "{} ({})", name, url),
            DisplayValue::File { name, url: None } => f.write_str(name),
            DisplayValue::Relation { class_name } => {
                write!(f, "View relation to {}", class_name)
            }
            DisplayValue::GeoPoint {
                latitude,
                longitude,
            } => write!(f, "{}, {}", latitude, longitude),
            DisplayValue::Elements(1) => f.write_str("1 element"),
            DisplayValue::Elements(n) => write!(f, "{} elements", n),
            DisplayValue::Keys(1) => f.write_str("1 key"),
            DisplayValue::Keys(n) => write!(f, "{} keys", n),
            DisplayValue::Raw(raw) => f.write_str(raw),
        }
    }
}

/// Decodes a field using its full schema entry, so relation columns can name
/// their target class even when the object doesn't carry the relation value.
pub fn decode_field(value: &Value, field: &FieldSchema) -> DisplayValue {
    if field.field_type == FieldType::Relation {
        if let Some(class_name) = field.target_class.as_deref() {
            return DisplayValue::Relation {
                class_name: class_name.to_string(),
            };
        }
    }
    decode(value, Some(&field.field_type))
}

/// Renders a raw JSON value for display, guided by the schema-declared type
/// when one is known.
pub fn decode(value: &Value, field_type: Option<&FieldType>) -> DisplayValue {
    if value.is_null() {
        return DisplayValue::Undefined;
    }
    let typed = match field_type {
        Some(FieldType::Date) => decode_date(value),
        Some(FieldType::File) => decode_file(value),
        Some(FieldType::Relation) => decode_relation(value),
        Some(FieldType::Boolean) => value.as_bool().map(DisplayValue::Bool),
        Some(FieldType::Array) => value.as_array().map(|a| DisplayValue::Elements(a.len())),
        Some(FieldType::Object) | Some(FieldType::ACL) => value
            .as_object()
            .filter(|map| !map.contains_key("__type"))
            .map(|map| DisplayValue::Keys(map.len())),
        _ => None,
    };
    typed.unwrap_or_else(|| decode_untyped(value))
}

fn decode_untyped(value: &Value) -> DisplayValue {
    match ParseValue::classify(value) {
        ParseValue::Null => DisplayValue::Undefined,
        ParseValue::Bool(b) => DisplayValue::Bool(b),
        ParseValue::Number(n) => DisplayValue::Number(n),
        ParseValue::String(s) => DisplayValue::Text(s),
        ParseValue::Array(items) => DisplayValue::Elements(items.len()),
        ParseValue::Object(map) => DisplayValue::Keys(map.len()),
        ParseValue::Pointer(pointer) => DisplayValue::Pointer {
            class_name: pointer.class_name,
            object_id: pointer.object_id,
        },
        ParseValue::File(file) => DisplayValue::File {
            name: file.name,
            url: Some(file.url),
        },
        ParseValue::Date(date) => match date.to_datetime() {
            Ok(dt) => DisplayValue::Date(dt),
            Err(_) => DisplayValue::Text(date.iso),
        },
        ParseValue::Relation(relation) => DisplayValue::Relation {
            class_name: relation.class_name,
        },
        ParseValue::GeoPoint(point) => DisplayValue::GeoPoint {
            latitude: point.latitude,
            longitude: point.longitude,
        },
        ParseValue::Bytes(_) | ParseValue::Unrecognized(_) => DisplayValue::Raw(value.to_string()),
    }
}

// Dates arrive as `{"__type":"Date","iso":...}` or, for createdAt/updatedAt, a bare string.
fn decode_date(value: &Value) -> Option<DisplayValue> {
    let iso = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("iso")?.as_str()?,
        _ => return None,
    };
    parse_iso(iso).ok().map(DisplayValue::Date)
}

// File references may omit the url before the server resolves them.
fn decode_file(value: &Value) -> Option<DisplayValue> {
    let map = value.as_object()?;
    let name = map.get("name")?.as_str()?;
    Some(DisplayValue::File {
        name: name.to_string(),
        url: map.get("url").and_then(Value::as_str).map(str::to_string),
    })
}

fn decode_relation(value: &Value) -> Option<DisplayValue> {
    let map = value.as_object()?;
    let class_name = map
        .get("className")
        .and_then(Value::as_str)
        .or_else(|| {
            // An AddRelation/RemoveRelation op names the class on its pointers.
            map.get("objects")?
                .as_array()?
                .first()?
                .get("className")?
                .as_str()
        })?;
    Some(DisplayValue::Relation {
        class_name: class_name.to_string(),
    })
}

/// Builds the JSON body fragment `{"<field_name>": <encoded input>}` for a
/// PUT or POST.
///
/// `target_class` is the schema's `targetClass` and is used for Pointer and
/// Relation fields when the input doesn't name a class itself.
pub fn encode(
    field_name: &str,
    input: &str,
    field_type: &FieldType,
    target_class: Option<&str>,
) -> Result<Value, ParseError> {
    if field_name.is_empty() {
        return Err(ParseError::InvalidInput(
            "Field name cannot be empty".to_string(),
        ));
    }
    let encoded = encode_value(input, field_type, target_class)?;
    let mut fragment = Map::new();
    fragment.insert(field_name.to_string(), encoded);
    Ok(Value::Object(fragment))
}

/// Like [`encode`], taking the type and target class from a schema entry.
pub fn encode_field(field_name: &str, input: &str, field: &FieldSchema) -> Result<Value, ParseError> {
    encode(
        field_name,
        input,
        &field.field_type,
        field.target_class.as_deref(),
    )
}

/// The fragment that removes a field from an object.
pub fn encode_delete(field_name: &str) -> Result<Value, ParseError> {
    if field_name.is_empty() {
        return Err(ParseError::InvalidInput(
            "Field name cannot be empty".to_string(),
        ));
    }
    let mut fragment = Map::new();
    fragment.insert(field_name.to_string(), json!({ "__op": "Delete" }));
    Ok(Value::Object(fragment))
}

/// Encodes user input as the wire value for a field of the given type.
pub fn encode_value(
    input: &str,
    field_type: &FieldType,
    target_class: Option<&str>,
) -> Result<Value, ParseError> {
    if *field_type == FieldType::String {
        return Ok(Value::String(input.to_string()));
    }

    let input = input.trim();
    if input.is_empty() {
        return Err(ParseError::InvalidInput(format!(
            "A value is required for a {} field",
            field_type
        )));
    }

    let encoded = match field_type {
        FieldType::String => Value::String(input.to_string()),
        FieldType::Number => encode_number(input),
        FieldType::Boolean => match input.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Value::Bool(true),
            "false" | "no" | "0" => Value::Bool(false),
            _ => Value::String(input.to_string()),
        },
        FieldType::Date => {
            let date = match parse_iso(input) {
                Ok(dt) => ParseDate::from_datetime(dt),
                Err(_) => ParseDate::new(input),
            };
            json!(date)
        }
        FieldType::Pointer => json!(encode_pointer(input, target_class)?),
        FieldType::Relation => encode_relation(input, target_class)?,
        FieldType::File => match input.split_once(char::is_whitespace) {
            Some((name, url)) => json!({"__type": "File", "name": name, "url": url.trim()}),
            None => json!({"__type": "File", "name": input}),
        },
        FieldType::GeoPoint => match parse_coordinates(input) {
            Some((latitude, longitude)) => json!(ParseGeoPoint::new(latitude, longitude)?),
            None => Value::String(input.to_string()),
        },
        FieldType::Bytes => json!({"__type": "Bytes", "base64": input}),
        FieldType::Polygon => match serde_json::from_str::<Value>(input) {
            Ok(coordinates) => json!({"__type": "Polygon", "coordinates": coordinates}),
            Err(_) => Value::String(input.to_string()),
        },
        FieldType::Array | FieldType::Object | FieldType::ACL | FieldType::Unknown(_) => {
            serde_json::from_str::<Value>(input).unwrap_or_else(|_| Value::String(input.to_string()))
        }
    };
    Ok(encoded)
}

fn encode_number(input: &str) -> Value {
    if let Ok(int) = input.parse::<i64>() {
        return Value::Number(int.into());
    }
    input
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(input.to_string()))
}

// Accepts `<objectId>` (class from the schema) or `<className>:<objectId>`.
fn encode_pointer(input: &str, target_class: Option<&str>) -> Result<Pointer, ParseError> {
    if let Some((class_name, object_id)) = input.split_once(':') {
        if !class_name.is_empty() && !object_id.is_empty() {
            return Ok(Pointer::new(class_name.trim(), object_id.trim()));
        }
    }
    match target_class {
        Some(class_name) => Ok(Pointer::new(class_name, input)),
        None => Err(ParseError::InvalidInput(format!(
            "Pointer '{}' needs a class: use <className>:<objectId>",
            input
        ))),
    }
}

// Accepts `add:<id>[,<id>...]` or `remove:<id>[,<id>...]`; no prefix means add.
fn encode_relation(input: &str, target_class: Option<&str>) -> Result<Value, ParseError> {
    let (remove, ids) = if let Some(rest) = input.strip_prefix("remove:") {
        (true, rest)
    } else {
        (false, input.strip_prefix("add:").unwrap_or(input))
    };
    let pointers = ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| encode_pointer(id, target_class))
        .collect::<Result<Vec<_>, _>>()?;
    if pointers.is_empty() {
        return Err(ParseError::InvalidInput(
            "A relation change needs at least one object id".to_string(),
        ));
    }
    let op = if remove {
        RelationOp::remove(&pointers)
    } else {
        RelationOp::add(&pointers)
    };
    Ok(serde_json::to_value(op)?)
}

fn parse_coordinates(input: &str) -> Option<(f64, f64)> {
    let (lat, lng) = input.split_once(',')?;
    Some((lat.trim().parse().ok()?, lng.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(input: &str, field_type: FieldType, target: Option<&str>) -> String {
        let fragment = encode("field", input, &field_type, target).expect("encode");
        decode(&fragment["field"], Some(&field_type)).to_string()
    }

    #[test]
    fn decode_covers_every_wire_tag() {
        let pointer = json!({"__type": "Pointer", "className": "_User", "objectId": "u1"});
        assert_eq!(decode(&pointer, Some(&FieldType::Pointer)).to_string(), "_User u1");

        let file = json!({"__type": "File", "name": "tfss-a.png", "url": "http://files/a.png"});
        assert_eq!(
            decode(&file, Some(&FieldType::File)).to_string(),
            "tfss-a.png (http://files/a.png)"
        );

        let date = json!({"__type": "Date", "iso": "2024-03-09T14:05:07.123Z"});
        assert_eq!(
            decode(&date, Some(&FieldType::Date)).to_string(),
            "2024-03-09 14:05:07 UTC"
        );

        let relation = json!({"__type": "Relation", "className": "Comment"});
        assert_eq!(
            decode(&relation, Some(&FieldType::Relation)).to_string(),
            "View relation to Comment"
        );
    }

    #[test]
    fn decode_shapes_and_scalars() {
        assert_eq!(decode(&json!([1, 2, 3]), Some(&FieldType::Array)).to_string(), "3 elements");
        assert_eq!(decode(&json!(["a"]), None).to_string(), "1 element");
        assert_eq!(decode(&json!({"a": 1, "b": 2}), Some(&FieldType::Object)).to_string(), "2 keys");
        assert_eq!(decode(&json!({"*": {"read": true}}), Some(&FieldType::ACL)).to_string(), "1 key");
        assert_eq!(decode(&json!(true), Some(&FieldType::Boolean)).to_string(), "True");
        assert_eq!(decode(&json!(false), None).to_string(), "False");
        assert_eq!(decode(&json!("plain"), Some(&FieldType::String)).to_string(), "plain");
        assert_eq!(decode(&json!(42), Some(&FieldType::Number)).to_string(), "42");
        assert_eq!(decode(&json!(2.5), Some(&FieldType::Number)).to_string(), "2.5");
        assert_eq!(decode(&Value::Null, Some(&FieldType::String)).to_string(), "undefined");
    }

    #[test]
    fn decode_bare_iso_strings_for_date_fields() {
        let created = json!("2022-01-01T12:23:45.678Z");
        assert_eq!(
            decode(&created, Some(&FieldType::Date)),
            DisplayValue::Date(parse_iso("2022-01-01T12:23:45.678Z").unwrap())
        );
        // Untyped strings stay strings.
        assert_eq!(decode(&created, None).to_string(), "2022-01-01T12:23:45.678Z");
    }

    #[test]
    fn decode_fails_soft() {
        let unknown = json!({"__type": "Polygon", "coordinates": [[0, 0], [1, 1]]});
        assert_eq!(
            decode(&unknown, Some(&FieldType::Unknown("Vector".to_string()))),
            DisplayValue::Raw(unknown.to_string())
        );

        // Declared as a pointer but the server sent a string.
        assert_eq!(decode(&json!("oops"), Some(&FieldType::Pointer)).to_string(), "oops");

        // Declared as a date but the iso is garbage.
        let bad_date = json!({"__type": "Date", "iso": "not-a-date"});
        assert_eq!(decode(&bad_date, Some(&FieldType::Date)).to_string(), "not-a-date");

        // Tagged pointer missing objectId.
        let half_pointer = json!({"__type": "Pointer", "className": "Post"});
        assert_eq!(
            decode(&half_pointer, Some(&FieldType::Pointer)),
            DisplayValue::Raw(half_pointer.to_string())
        );
    }

    #[test]
    fn decode_field_uses_target_class_for_relations() {
        let field = FieldSchema::new(FieldType::Relation).with_target_class("_Role");
        assert_eq!(decode_field(&Value::Null, &field).to_string(), "View relation to _Role");
    }

    #[test]
    fn encode_builds_wire_fragments() {
        assert_eq!(
            encode("name", "Sean", &FieldType::String, None).unwrap(),
            json!({"name": "Sean"})
        );
        assert_eq!(
            encode("owner", "u1", &FieldType::Pointer, Some("_User")).unwrap(),
            json!({"owner": {"__type": "Pointer", "className": "_User", "objectId": "u1"}})
        );
        assert_eq!(
            encode("when", "2024-03-09T14:05:07Z", &FieldType::Date, None).unwrap(),
            json!({"when": {"__type": "Date", "iso": "2024-03-09T14:05:07.000Z"}})
        );
        assert_eq!(
            encode("likes", "remove:a, b", &FieldType::Relation, Some("_User")).unwrap(),
            json!({"likes": {"__op": "RemoveRelation", "objects": [
                {"__type": "Pointer", "className": "_User", "objectId": "a"},
                {"__type": "Pointer", "className": "_User", "objectId": "b"}
            ]}})
        );
        assert_eq!(encode_delete("old").unwrap(), json!({"old": {"__op": "Delete"}}));
    }

    #[test]
    fn encode_passes_malformed_input_through() {
        assert_eq!(
            encode("score", "twelve", &FieldType::Number, None).unwrap(),
            json!({"score": "twelve"})
        );
        assert_eq!(
            encode("when", "next tuesday", &FieldType::Date, None).unwrap(),
            json!({"when": {"__type": "Date", "iso": "next tuesday"}})
        );
        assert_eq!(
            encode("tags", "[1, 2", &FieldType::Array, None).unwrap(),
            json!({"tags": "[1, 2"})
        );
        assert_eq!(
            encode("flag", "maybe", &FieldType::Boolean, None).unwrap(),
            json!({"flag": "maybe"})
        );
    }

    #[test]
    fn encode_presence_checks() {
        assert!(encode("", "x", &FieldType::String, None).is_err());
        assert!(encode("score", "  ", &FieldType::Number, None).is_err());
        assert!(encode("owner", "u1", &FieldType::Pointer, None).is_err());
        assert!(encode("likes", "add:", &FieldType::Relation, Some("_User")).is_err());
        // Empty strings are a legitimate String value.
        assert_eq!(
            encode("note", "", &FieldType::String, None).unwrap(),
            json!({"note": ""})
        );
    }

    #[test]
    fn round_trips_per_type() {
        assert_eq!(round_trip("hello", FieldType::String, None), "hello");
        assert_eq!(round_trip("42", FieldType::Number, None), "42");
        assert_eq!(round_trip("yes", FieldType::Boolean, None), "True");
        assert_eq!(round_trip("0", FieldType::Boolean, None), "False");
        assert_eq!(
            round_trip("2024-03-09T14:05:07Z", FieldType::Date, None),
            "2024-03-09 14:05:07 UTC"
        );
        assert_eq!(round_trip("Post:p1", FieldType::Pointer, None), "Post p1");
        assert_eq!(round_trip("p1", FieldType::Pointer, Some("Post")), "Post p1");
        assert_eq!(
            round_trip("a.png http://files/a.png", FieldType::File, None),
            "a.png (http://files/a.png)"
        );
        assert_eq!(round_trip("a.png", FieldType::File, None), "a.png");
        assert_eq!(round_trip("[1,2]", FieldType::Array, None), "2 elements");
        assert_eq!(round_trip(r#"{"k":"v"}"#, FieldType::Object, None), "1 key");
        assert_eq!(
            round_trip("add:u1", FieldType::Relation, Some("_User")),
            "View relation to _User"
        );
        assert_eq!(round_trip("52.5, 13.4", FieldType::GeoPoint, None), "52.5, 13.4");
    }

    #[test]
    fn geopoint_out_of_range_is_rejected() {
        assert!(encode("loc", "91,0", &FieldType::GeoPoint, None).is_err());
        assert_eq!(
            encode("loc", "north", &FieldType::GeoPoint, None).unwrap(),
            json!({"loc": "north"})
        );
    }
}
