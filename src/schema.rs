use crate::error::ParseError;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;

/// Represents the possible data types for a field in a Parse class schema.
///
/// Tags the server sends that are not listed here deserialize to `Unknown`
/// so a newer server never breaks schema browsing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    Object, // Generic JSON object
    Array,
    Pointer,
    Relation,
    File,
    GeoPoint,
    ACL,
    Bytes,
    Polygon,
    Unknown(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::String => "String",
            FieldType::Number => "Number",
            FieldType::Boolean => "Boolean",
            FieldType::Date => "Date",
            FieldType::Object => "Object",
            FieldType::Array => "Array",
            FieldType::Pointer => "Pointer",
            FieldType::Relation => "Relation",
            FieldType::File => "File",
            FieldType::GeoPoint => "GeoPoint",
            FieldType::ACL => "ACL",
            FieldType::Bytes => "Bytes",
            FieldType::Polygon => "Polygon",
            FieldType::Unknown(tag) => tag,
        }
    }

    /// Pointer and Relation fields carry a `targetClass`.
    pub fn needs_target_class(&self) -> bool {
        matches!(self, FieldType::Pointer | FieldType::Relation)
    }
}

impl From<String> for FieldType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "String" => FieldType::String,
            "Number" => FieldType::Number,
            "Boolean" => FieldType::Boolean,
            "Date" => FieldType::Date,
            "Object" => FieldType::Object,
            "Array" => FieldType::Array,
            "Pointer" => FieldType::Pointer,
            "Relation" => FieldType::Relation,
            "File" => FieldType::File,
            "GeoPoint" => FieldType::GeoPoint,
            "ACL" => FieldType::ACL,
            "Bytes" => FieldType::Bytes,
            "Polygon" => FieldType::Polygon,
            _ => FieldType::Unknown(tag),
        }
    }
}

impl From<&str> for FieldType {
    fn from(tag: &str) -> Self {
        FieldType::from(tag.to_string())
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the schema definition for a single field within a Parse class.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FieldSchema {
    /// The data type of the field.
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// For `Pointer` and `Relation` types, this specifies the target class name.
    #[serde(rename = "targetClass", skip_serializing_if = "Option::is_none")]
    pub target_class: Option<String>,

    /// Indicates if the field is required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    /// The default value for the field.
    #[serde(rename = "defaultValue", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl FieldSchema {
    pub fn new(field_type: FieldType) -> Self {
        FieldSchema {
            field_type,
            target_class: None,
            required: None,
            default_value: None,
        }
    }

    pub fn with_target_class(mut self, class_name: impl Into<String>) -> Self {
        self.target_class = Some(class_name.into());
        self
    }
}

/// Represents the Class Level Permissions (CLP) for a Parse class schema.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClassLevelPermissionsSchema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<HashMap<String, bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub find: Option<HashMap<String, bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<HashMap<String, bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create: Option<HashMap<String, bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<HashMap<String, bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<HashMap<String, bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_field: Option<HashMap<String, bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_user_fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_user_fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protected_fields: Option<HashMap<String, Vec<String>>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum IndexFieldType {
    SortOrder(i32),
    Text(String),
    Other(Value),
}

/// Represents the schema for a Parse class, including its fields, CLP, and indexes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParseSchema {
    pub class_name: String,
    pub fields: HashMap<String, FieldSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_level_permissions: Option<ClassLevelPermissionsSchema>,
    /// Index name → (field name → sort order or index kind).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexes: Option<HashMap<String, HashMap<String, IndexFieldType>>>,
}

/// Fields Parse Server adds to every class.
pub const DEFAULT_FIELDS: [&str; 4] = ["objectId", "createdAt", "updatedAt", "ACL"];

impl ParseSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    pub fn field_type(&self, name: &str) -> Option<&FieldType> {
        self.fields.get(name).map(|f| &f.field_type)
    }

    pub fn target_class(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|f| f.target_class.as_deref())
    }

    /// Field names in display order: the built-in fields first, then the rest alphabetically.
    pub fn field_names(&self) -> Vec<&str> {
        let mut builtin: Vec<&str> = DEFAULT_FIELDS
            .iter()
            .copied()
            .filter(|name| self.fields.contains_key(*name))
            .collect();
        let mut custom: Vec<&str> = self
            .fields
            .keys()
            .map(String::as_str)
            .filter(|name| !DEFAULT_FIELDS.contains(name))
            .collect();
        custom.sort_unstable();
        builtin.extend(custom);
        builtin
    }

    /// Whether the class is one of Parse's system classes (`_User`, `_Role`, ...).
    pub fn is_system_class(&self) -> bool {
        self.class_name.starts_with('_')
    }
}

/// Represents the response structure when fetching all schemas.
#[derive(Debug, Deserialize, Clone)]
pub struct GetAllSchemasResponse {
    pub results: Vec<ParseSchema>,
}

/// Checks a class name the way Parse Server does before we send it anywhere.
pub fn validate_class_name(class_name: &str) -> Result<(), ParseError> {
    if class_name.is_empty() {
        return Err(ParseError::InvalidClassName(
            "Class name cannot be empty".to_string(),
        ));
    }
    if !class_name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
    {
        return Err(ParseError::InvalidClassName(format!(
            "'{}' must start with a letter or underscore.",
            class_name
        )));
    }
    if !class_name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(ParseError::InvalidClassName(format!(
            "'{}' can only contain letters, numbers, or underscores.",
            class_name
        )));
    }
    Ok(())
}

impl crate::ParseClient {
    /// Fetches the schemas for all classes.
    pub async fn get_all_schemas(&self) -> Result<GetAllSchemasResponse, ParseError> {
        self._request(Method::GET, "schemas", None::<&Value>).await
    }

    /// Fetches the schema for a single class.
    pub async fn get_class_schema(&self, class_name: &str) -> Result<ParseSchema, ParseError> {
        validate_class_name(class_name)?;
        let endpoint = format!("schemas/{}", class_name);
        self._request(Method::GET, &endpoint, None::<&Value>).await
    }

    /// Creates a new class with the given fields.
    ///
    /// `fields` may be empty; Parse Server still adds `objectId`, `createdAt`,
    /// `updatedAt` and `ACL`.
    pub async fn create_class_schema(
        &self,
        class_name: &str,
        fields: &HashMap<String, FieldSchema>,
        class_level_permissions: Option<&ClassLevelPermissionsSchema>,
    ) -> Result<ParseSchema, ParseError> {
        validate_class_name(class_name)?;
        let mut payload = json!({
            "className": class_name,
            "fields": fields,
        });
        if let Some(clp) = class_level_permissions {
            payload["classLevelPermissions"] = serde_json::to_value(clp)?;
        }
        let endpoint = format!("schemas/{}", class_name);
        self._request(Method::POST, &endpoint, Some(&payload)).await
    }

    /// Applies a raw schema update payload (fields, CLP, indexes).
    /// Fields or indexes are removed with `{"__op": "Delete"}`.
    pub async fn update_class_schema<T: Serialize + Send + Sync>(
        &self,
        class_name: &str,
        schema_update_payload: &T,
    ) -> Result<ParseSchema, ParseError> {
        validate_class_name(class_name)?;
        let endpoint = format!("schemas/{}", class_name);
        self._request(Method::PUT, &endpoint, Some(schema_update_payload))
            .await
    }

    /// Adds one field to an existing class.
    pub async fn add_field(
        &self,
        class_name: &str,
        field_name: &str,
        field: &FieldSchema,
    ) -> Result<ParseSchema, ParseError> {
        if field_name.is_empty() {
            return Err(ParseError::InvalidInput(
                "Field name cannot be empty".to_string(),
            ));
        }
        if field.field_type.needs_target_class() && field.target_class.is_none() {
            return Err(ParseError::InvalidInput(format!(
                "{} field '{}' needs a target class",
                field.field_type, field_name
            )));
        }
        let payload = json!({
            "className": class_name,
            "fields": { field_name: field },
        });
        self.update_class_schema(class_name, &payload).await
    }

    /// Removes one field (and its data) from a class.
    pub async fn delete_field(
        &self,
        class_name: &str,
        field_name: &str,
    ) -> Result<ParseSchema, ParseError> {
        if DEFAULT_FIELDS.contains(&field_name) {
            return Err(ParseError::InvalidInput(format!(
                "'{}' is a default field and cannot be deleted",
                field_name
            )));
        }
        let payload = json!({
            "className": class_name,
            "fields": { field_name: { "__op": "Delete" } },
        });
        self.update_class_schema(class_name, &payload).await
    }

    /// Deletes a class schema. The server refuses with
    /// [`ParseError::ClassNotEmpty`] while the class still holds objects.
    pub async fn delete_class_schema(&self, class_name: &str) -> Result<(), ParseError> {
        validate_class_name(class_name)?;
        let endpoint = format!("schemas/{}", class_name);
        let _response: Value = self
            ._request(Method::DELETE, &endpoint, None::<&Value>)
            .await?;
        Ok(())
    }

    /// Deletes a class schema, offering to empty the class first.
    ///
    /// When the server reports the class is not empty, `confirm` is asked
    /// (with the server's error) whether to delete every object. If it
    /// agrees, all rows are deleted and the schema delete is retried once.
    /// Returns the number of objects purged.
    pub async fn delete_class_schema_with_purge<F>(
        &self,
        class_name: &str,
        confirm: F,
    ) -> Result<usize, ParseError>
    where
        F: FnOnce(&ParseError) -> bool,
    {
        match self.delete_class_schema(class_name).await {
            Ok(()) => Ok(0),
            Err(err) if err.is_class_not_empty() => {
                if !confirm(&err) {
                    log::info!("Purge of '{}' declined; schema left in place", class_name);
                    return Err(err);
                }
                let purged = self.delete_all_objects(class_name).await?;
                log::info!(
                    "Purged {} objects from '{}', retrying schema delete",
                    purged,
                    class_name
                );
                self.delete_class_schema(class_name).await?;
                Ok(purged)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> ParseSchema {
        serde_json::from_value(json!({
            "className": "GameScore",
            "fields": {
                "objectId": {"type": "String"},
                "createdAt": {"type": "Date"},
                "updatedAt": {"type": "Date"},
                "ACL": {"type": "ACL"},
                "score": {"type": "Number", "required": true},
                "player": {"type": "Pointer", "targetClass": "_User"},
                "fans": {"type": "Relation", "targetClass": "_User"},
                "area": {"type": "Polygon"},
                "vector": {"type": "Vector3D"}
            },
            "classLevelPermissions": {
                "find": {"*": true},
                "protectedFields": {"*": []}
            },
            "indexes": {"_id_": {"_id": 1}}
        }))
        .expect("schema should deserialize")
    }

    #[test]
    fn unknown_field_types_do_not_fail() {
        let schema = sample_schema();
        assert_eq!(
            schema.field_type("vector"),
            Some(&FieldType::Unknown("Vector3D".to_string()))
        );
        assert_eq!(schema.field_type("area"), Some(&FieldType::Polygon));
        let round_trip = serde_json::to_value(&schema.fields["vector"]).unwrap();
        assert_eq!(round_trip["type"], "Vector3D");
    }

    #[test]
    fn exposes_target_classes() {
        let schema = sample_schema();
        assert_eq!(schema.target_class("player"), Some("_User"));
        assert_eq!(schema.target_class("score"), None);
        assert_eq!(schema.target_class("missing"), None);
    }

    #[test]
    fn field_names_put_defaults_first() {
        let schema = sample_schema();
        assert_eq!(
            schema.field_names(),
            vec![
                "objectId",
                "createdAt",
                "updatedAt",
                "ACL",
                "area",
                "fans",
                "player",
                "score",
                "vector"
            ]
        );
    }

    #[test]
    fn class_name_validation() {
        assert!(validate_class_name("GameScore").is_ok());
        assert!(validate_class_name("_User").is_ok());
        assert!(validate_class_name("").is_err());
        assert!(validate_class_name("9lives").is_err());
        assert!(validate_class_name("Game-Score").is_err());
    }

    #[test]
    fn field_schema_serializes_compactly() {
        let field = FieldSchema::new(FieldType::Pointer).with_target_class("Post");
        assert_eq!(
            serde_json::to_value(&field).unwrap(),
            json!({"type": "Pointer", "targetClass": "Post"})
        );
    }
}
