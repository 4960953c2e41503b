// src/object.rs

use crate::client::ParseClient;
use crate::query::ParseQuery;
use crate::schema::{validate_class_name, ParseSchema};
use crate::types::date::ParseDate;
use crate::wire::{self, DisplayValue};
use crate::ParseError;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Page size used when walking a whole class.
const PURGE_PAGE_SIZE: isize = 1000;

// Helper function to deserialize a string into Option<ParseDate>
pub fn deserialize_string_to_option_parse_date<'de, D>(
    deserializer: D,
) -> Result<Option<ParseDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.map(ParseDate::new))
}

// Helper function to deserialize a string into ParseDate
pub fn deserialize_string_to_parse_date<'de, D>(deserializer: D) -> Result<ParseDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = String::deserialize(deserializer)?;
    Ok(ParseDate::new(s))
}

/// One row of a class: the server-managed fields plus everything else as raw JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParseObject {
    #[serde(skip_serializing_if = "Option::is_none", rename = "objectId")]
    pub object_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_string_to_option_parse_date",
        skip_serializing,
        rename = "createdAt"
    )]
    pub created_at: Option<ParseDate>,
    #[serde(
        default,
        deserialize_with = "deserialize_string_to_option_parse_date",
        skip_serializing,
        rename = "updatedAt"
    )]
    pub updated_at: Option<ParseDate>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    // Context only; never sent.
    #[serde(skip_serializing, default)]
    pub class_name: String,
}

impl ParseObject {
    pub fn new(class_name: &str) -> Self {
        ParseObject {
            class_name: class_name.to_string(),
            fields: Map::new(),
            object_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn set<T: Serialize>(&mut self, field_name: &str, value: T) -> Result<(), ParseError> {
        self.fields
            .insert(field_name.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn get<T: DeserializeOwned>(&self, field_name: &str) -> Option<T> {
        self.fields
            .get(field_name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// The raw JSON of a field, including the server-managed ones.
    pub fn raw(&self, field_name: &str) -> Option<Value> {
        match field_name {
            "objectId" => self.object_id.clone().map(Value::String),
            "createdAt" => self.created_at.as_ref().map(|d| Value::String(d.iso.clone())),
            "updatedAt" => self.updated_at.as_ref().map(|d| Value::String(d.iso.clone())),
            _ => self.fields.get(field_name).cloned(),
        }
    }

    /// Renders a field for display using its schema-declared type.
    pub fn display(&self, schema: &ParseSchema, field_name: &str) -> DisplayValue {
        let raw = self.raw(field_name).unwrap_or(Value::Null);
        match schema.field(field_name) {
            Some(field) => wire::decode_field(&raw, field),
            None => wire::decode(&raw, None),
        }
    }

    /// A pointer to this object, once it has been saved.
    pub fn to_pointer(&self) -> Option<crate::Pointer> {
        self.object_id
            .as_ref()
            .map(|id| crate::Pointer::new(self.class_name.clone(), id.clone()))
    }

    pub fn increment(&mut self, field_name: &str, amount: i64) {
        let op = json!({
            "__op": "Increment",
            "amount": amount
        });
        self.fields.insert(field_name.to_string(), op);
    }

    /// Marks a field for removal on the next update.
    pub fn unset(&mut self, field_name: &str) {
        self.fields
            .insert(field_name.to_string(), json!({ "__op": "Delete" }));
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateObjectResponse {
    pub object_id: String,
    #[serde(deserialize_with = "deserialize_string_to_parse_date")]
    pub created_at: ParseDate,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateObjectResponse {
    #[serde(deserialize_with = "deserialize_string_to_parse_date")]
    pub updated_at: ParseDate,
}

fn require_object_id(object_id: &str) -> Result<(), ParseError> {
    if object_id.is_empty() {
        return Err(ParseError::InvalidInput(
            "Object ID cannot be empty".to_string(),
        ));
    }
    Ok(())
}

impl ParseClient {
    /// `POST /classes/<class>`
    pub async fn create_object<T: Serialize + Send + Sync>(
        &self,
        class_name: &str,
        data: &T,
    ) -> Result<CreateObjectResponse, ParseError> {
        validate_class_name(class_name)?;
        let endpoint = format!("classes/{}", class_name);
        self.post(&endpoint, data).await
    }

    /// `GET /classes/<class>/<id>`
    pub async fn retrieve_object(
        &self,
        class_name: &str,
        object_id: &str,
    ) -> Result<ParseObject, ParseError> {
        validate_class_name(class_name)?;
        require_object_id(object_id)?;

        let endpoint = format!("classes/{}/{}", class_name, object_id);
        let mut object: ParseObject = self.get(&endpoint).await?;
        object.class_name = class_name.to_string();
        Ok(object)
    }

    /// `PUT /classes/<class>/<id>` with a partial body, typically built with
    /// [`crate::wire::encode`].
    pub async fn update_object<T: Serialize + Send + Sync>(
        &self,
        class_name: &str,
        object_id: &str,
        data: &T,
    ) -> Result<UpdateObjectResponse, ParseError> {
        validate_class_name(class_name)?;
        require_object_id(object_id)?;

        let endpoint = format!("classes/{}/{}", class_name, object_id);
        self.put(&endpoint, data).await
    }

    /// `DELETE /classes/<class>/<id>`
    pub async fn delete_object(&self, class_name: &str, object_id: &str) -> Result<(), ParseError> {
        validate_class_name(class_name)?;
        require_object_id(object_id)?;

        let endpoint = format!("classes/{}/{}", class_name, object_id);
        let response_value: Value = self.delete::<Value>(&endpoint).await?;

        if response_value.as_object().is_some_and(|obj| obj.is_empty()) {
            Ok(())
        } else {
            Err(ParseError::UnexpectedResponse(format!(
                "Expected empty JSON object {{}} for delete, got: {:?}",
                response_value
            )))
        }
    }

    /// Deletes every object in a class, one request per object.
    /// Returns how many objects were deleted.
    pub async fn delete_all_objects(&self, class_name: &str) -> Result<usize, ParseError> {
        validate_class_name(class_name)?;

        let mut query = ParseQuery::new(class_name);
        query.limit(PURGE_PAGE_SIZE).select(&["objectId"]);

        let mut deleted = 0;
        loop {
            let page = self.find_objects(&query).await?;
            if page.is_empty() {
                break;
            }
            for object in &page {
                if let Some(object_id) = &object.object_id {
                    self.delete_object(class_name, object_id).await?;
                    deleted += 1;
                }
            }
            log::debug!("Deleted {} objects from '{}' so far", deleted, class_name);
        }
        Ok(deleted)
    }
}
