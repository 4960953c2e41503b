// src/query.rs

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::{client::ParseClient, error::ParseError, object::ParseObject, Pointer};

/// `limit` used by the object browser when none is set.
pub const DEFAULT_LIMIT: isize = 100;
/// `order` used by the object browser when none is set: newest first.
pub const DEFAULT_ORDER: &str = "-createdAt";

/// Represents a query to be performed against a Parse Server class.
#[derive(Debug, Clone)]
pub struct ParseQuery {
    class_name: String,
    conditions: Map<String, Value>,
    limit: Option<isize>,
    skip: Option<usize>,
    order: Option<String>,
    include: Option<String>,
    keys: Option<String>, // For selecting specific fields
}

impl ParseQuery {
    /// Creates a new `ParseQuery` for the specified class name.
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            conditions: Map::new(),
            limit: None,
            skip: None,
            order: None,
            include: None,
            keys: None,
        }
    }

    /// Returns the class name this query targets.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The accumulated `where` conditions.
    pub fn conditions(&self) -> &Map<String, Value> {
        &self.conditions
    }

    // Helper to add a simple condition like "field": "value"
    fn add_simple_condition(&mut self, key: &str, value: Value) -> &mut Self {
        self.conditions.insert(key.to_string(), value);
        self
    }

    // Helper to add an operator condition like "field": {"$op": "value"}.
    // Operators on the same field accumulate, so `$gt` and `$lt` can form a range.
    fn add_operator_condition(&mut self, key: &str, operator: &str, value: Value) -> &mut Self {
        match self.conditions.get_mut(key) {
            Some(Value::Object(existing)) if existing.keys().all(|k| k.starts_with('$')) => {
                existing.insert(operator.to_string(), value);
            }
            _ => {
                let mut op_map = Map::new();
                op_map.insert(operator.to_string(), value);
                self.conditions
                    .insert(key.to_string(), Value::Object(op_map));
            }
        }
        self
    }

    /// Adds a constraint to the query that a field must be equal to a specified value.
    pub fn equal_to<V: Serialize>(&mut self, key: &str, value: V) -> &mut Self {
        match serde_json::to_value(value) {
            Ok(json_val) => self.add_simple_condition(key, json_val),
            Err(e) => {
                log::warn!("Ignoring equal_to on '{}': {}", key, e);
                self
            }
        }
    }

    /// Adds a constraint to the query that a field must not be equal to a specified value.
    pub fn not_equal_to<V: Serialize>(&mut self, key: &str, value: V) -> &mut Self {
        match serde_json::to_value(value) {
            Ok(json_val) => self.add_operator_condition(key, "$ne", json_val),
            Err(_) => self,
        }
    }

    /// Adds a constraint to the query that a field must exist.
    pub fn exists(&mut self, key: &str) -> &mut Self {
        self.add_operator_condition(key, "$exists", Value::Bool(true))
    }

    /// Adds a constraint to the query that a field must not exist.
    pub fn does_not_exist(&mut self, key: &str) -> &mut Self {
        self.add_operator_condition(key, "$exists", Value::Bool(false))
    }

    pub fn greater_than<V: Serialize>(&mut self, key: &str, value: V) -> &mut Self {
        match serde_json::to_value(value) {
            Ok(json_val) => self.add_operator_condition(key, "$gt", json_val),
            Err(_) => self,
        }
    }

    pub fn greater_than_or_equal_to<V: Serialize>(&mut self, key: &str, value: V) -> &mut Self {
        match serde_json::to_value(value) {
            Ok(json_val) => self.add_operator_condition(key, "$gte", json_val),
            Err(_) => self,
        }
    }

    pub fn less_than<V: Serialize>(&mut self, key: &str, value: V) -> &mut Self {
        match serde_json::to_value(value) {
            Ok(json_val) => self.add_operator_condition(key, "$lt", json_val),
            Err(_) => self,
        }
    }

    pub fn less_than_or_equal_to<V: Serialize>(&mut self, key: &str, value: V) -> &mut Self {
        match serde_json::to_value(value) {
            Ok(json_val) => self.add_operator_condition(key, "$lte", json_val),
            Err(_) => self,
        }
    }

    /// Adds a constraint for finding objects where a field's value is contained in the provided list of values.
    pub fn contained_in<V: Serialize>(&mut self, key: &str, values: Vec<V>) -> &mut Self {
        match serde_json::to_value(values) {
            Ok(json_val_array) => self.add_operator_condition(key, "$in", json_val_array),
            Err(_) => self,
        }
    }

    pub fn not_contained_in<V: Serialize>(&mut self, key: &str, values: Vec<V>) -> &mut Self {
        match serde_json::to_value(values) {
            Ok(json_val_array) => self.add_operator_condition(key, "$nin", json_val_array),
            Err(_) => self,
        }
    }

    /// Adds a constraint for finding objects where a field contains all of the provided values (for array fields).
    pub fn contains_all<V: Serialize>(&mut self, key: &str, values: Vec<V>) -> &mut Self {
        match serde_json::to_value(values) {
            Ok(json_val_array) => self.add_operator_condition(key, "$all", json_val_array),
            Err(_) => self,
        }
    }

    pub fn starts_with(&mut self, key: &str, prefix: &str) -> &mut Self {
        self.add_operator_condition(
            key,
            "$regex",
            Value::String(format!("^{}", regex::escape(prefix))),
        )
    }

    /// Adds a constraint for finding objects where a string field contains a given substring.
    pub fn contains(&mut self, key: &str, substring: &str) -> &mut Self {
        self.add_operator_condition(
            key,
            "$regex",
            Value::String(format!(".*{}.*", regex::escape(substring))),
        )
    }

    /// Adds a constraint for finding objects where a string field matches a given regex pattern.
    /// Modifiers can be 'i' for case-insensitive, 'm' for multiline, etc.
    pub fn matches_regex(
        &mut self,
        key: &str,
        regex_pattern: &str,
        modifiers: Option<&str>,
    ) -> &mut Self {
        self.add_operator_condition(key, "$regex", Value::String(regex_pattern.to_string()));
        if let Some(mods) = modifiers {
            self.add_operator_condition(key, "$options", Value::String(mods.to_string()));
        }
        self
    }

    /// Matches objects whose pointer field `key` points at `target`.
    pub fn equal_to_pointer(&mut self, key: &str, target: &Pointer) -> &mut Self {
        self.add_simple_condition(key, json!(target))
    }

    /// Restricts the query to the members of a relation: objects that are in
    /// the `key_on_parent_object` relation of `parent_object`.
    ///
    /// Produces `{"$relatedTo":{"object":<Pointer>,"key":"<key>"}}`.
    pub fn related_to(&mut self, parent_object: &Pointer, key_on_parent_object: &str) -> &mut Self {
        self.conditions.insert(
            "$relatedTo".to_string(),
            json!({
                "object": parent_object,
                "key": key_on_parent_object,
            }),
        );
        self
    }

    /// Matches objects whose pointer field `key` points at an object matched by `inner`.
    ///
    /// Produces `{"<key>":{"$inQuery":{"where":{...},"className":"<class>"}}}`.
    pub fn matches_query(&mut self, key: &str, inner: &ParseQuery) -> &mut Self {
        self.add_operator_condition(key, "$inQuery", inner.as_subquery())
    }

    /// Negation of [`ParseQuery::matches_query`], using `$notInQuery`.
    pub fn does_not_match_query(&mut self, key: &str, inner: &ParseQuery) -> &mut Self {
        self.add_operator_condition(key, "$notInQuery", inner.as_subquery())
    }

    fn as_subquery(&self) -> Value {
        json!({
            "where": self.conditions,
            "className": self.class_name,
        })
    }

    /// Merges a hand-written `where` body (the JSON an administrator typed)
    /// into the conditions. Keys in the fragment replace existing ones.
    /// Blank input is accepted and adds nothing.
    pub fn where_fragment(&mut self, raw: &str) -> Result<&mut Self, ParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(self);
        }
        let parsed: Value = serde_json::from_str(trimmed).map_err(|e| {
            ParseError::InvalidQuery(format!("where must be a JSON object: {}", e))
        })?;
        match parsed {
            Value::Object(map) => {
                self.conditions.extend(map);
                Ok(self)
            }
            other => Err(ParseError::InvalidQuery(format!(
                "where must be a JSON object, got {}",
                other
            ))),
        }
    }

    // --- Pagination and Sorting ---

    /// Sets the maximum number of results to return.
    pub fn limit(&mut self, count: isize) -> &mut Self {
        self.limit = Some(count);
        self
    }

    /// Sets the number of results to skip before returning.
    pub fn skip(&mut self, count: usize) -> &mut Self {
        self.skip = Some(count);
        self
    }

    /// Sets the order of the results. Replaces any existing order.
    /// Takes a comma-separated string of field names. Prefix with '-' for descending order.
    /// e.g., "score,-playerName"
    pub fn order(&mut self, field_names: &str) -> &mut Self {
        self.order = Some(field_names.to_string());
        self
    }

    // Helper to append to the order string
    fn append_order_key(&mut self, key: &str, descending: bool) {
        let prefix = if descending { "-" } else { "" };
        let new_order_key = format!("{}{}", prefix, key);
        if let Some(existing_order) = &mut self.order {
            if !existing_order.is_empty() {
                existing_order.push(',');
            }
            existing_order.push_str(&new_order_key);
        } else {
            self.order = Some(new_order_key);
        }
    }

    pub fn order_by_ascending(&mut self, key: &str) -> &mut Self {
        self.order = Some(key.to_string());
        self
    }

    pub fn order_by_descending(&mut self, key: &str) -> &mut Self {
        self.order = Some(format!("-{}", key));
        self
    }

    /// Adds a key to sort the results by in ascending order. Appends to existing sort order.
    pub fn add_ascending_order(&mut self, key: &str) -> &mut Self {
        self.append_order_key(key, false);
        self
    }

    /// Adds a key to sort the results by in descending order. Appends to existing sort order.
    pub fn add_descending_order(&mut self, key: &str) -> &mut Self {
        self.append_order_key(key, true);
        self
    }

    /// Includes the objects behind the given pointer key(s) in the results.
    pub fn include(&mut self, keys_to_include: &[&str]) -> &mut Self {
        self.include = Some(merge_csv(self.include.take(), keys_to_include));
        self
    }

    /// Restricts the fields returned for all matching objects.
    pub fn select(&mut self, keys_to_select: &[&str]) -> &mut Self {
        self.keys = Some(merge_csv(self.keys.take(), keys_to_select));
        self
    }

    /// The `where` conditions as compact JSON, if any were added.
    pub fn where_json(&self) -> Option<String> {
        if self.conditions.is_empty() {
            None
        } else {
            serde_json::to_string(&self.conditions).ok()
        }
    }

    // Parameters for reqwest; the URL layer does the encoding.
    pub fn build_query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(where_json) = self.where_json() {
            params.push(("where".to_string(), where_json));
        }
        if let Some(limit_val) = self.limit {
            params.push(("limit".to_string(), limit_val.to_string()));
        }
        if let Some(skip_val) = self.skip {
            params.push(("skip".to_string(), skip_val.to_string()));
        }
        if let Some(order_val) = &self.order {
            params.push(("order".to_string(), order_val.clone()));
        }
        if let Some(include_val) = &self.include {
            params.push(("include".to_string(), include_val.clone()));
        }
        if let Some(keys_val) = &self.keys {
            params.push(("keys".to_string(), keys_val.clone()));
        }
        params
    }

    /// The parameters `find` sends: [`ParseQuery::build_query_params`] with
    /// [`DEFAULT_LIMIT`] and [`DEFAULT_ORDER`] standing in for an unset
    /// `limit` or `order`, so a listing matches its replayed query string.
    pub fn find_params(&self) -> Vec<(String, String)> {
        let mut query = self.clone();
        if query.limit.is_none() {
            query.limit = Some(DEFAULT_LIMIT);
        }
        if query.order.is_none() {
            query.order = Some(DEFAULT_ORDER.to_string());
        }
        query.build_query_params()
    }

    /// Renders the query as the string that gets saved and replayed:
    /// `limit=<n>&order=<±field>&where=<url-encoded-json>&keys=<csv>&include=<field>`.
    ///
    /// `limit` and `order` are always present (falling back to
    /// [`DEFAULT_LIMIT`] and [`DEFAULT_ORDER`]); only the `where` JSON is
    /// percent-encoded.
    pub fn to_query_string(&self) -> String {
        let mut fragments = vec![
            format!("limit={}", self.limit.unwrap_or(DEFAULT_LIMIT)),
            format!("order={}", self.order.as_deref().unwrap_or(DEFAULT_ORDER)),
        ];
        if let Some(where_json) = self.where_json() {
            let encoded: String =
                url::form_urlencoded::byte_serialize(where_json.as_bytes()).collect();
            fragments.push(format!("where={}", encoded));
        }
        if let Some(keys_val) = self.keys.as_deref().filter(|k| !k.is_empty()) {
            fragments.push(format!("keys={}", keys_val));
        }
        if let Some(include_val) = self.include.as_deref().filter(|i| !i.is_empty()) {
            fragments.push(format!("include={}", include_val));
        }
        if let Some(skip_val) = self.skip {
            fragments.push(format!("skip={}", skip_val));
        }
        fragments.join("&")
    }

    // --- Execution Methods ---

    /// Retrieves the objects matching this query.
    pub async fn find<T: DeserializeOwned + Send + Sync + 'static>(
        &self,
        client: &ParseClient,
    ) -> Result<Vec<T>, ParseError> {
        let endpoint = format!("classes/{}", self.class_name);
        let params = self.find_params();
        let response_wrapper: FindResponse<T> =
            client._get_with_url_params(&endpoint, &params).await?;
        Ok(response_wrapper.results)
    }

    /// Retrieves the first object matching this query.
    pub async fn first<T: DeserializeOwned + Send + Sync + 'static>(
        &self,
        client: &ParseClient,
    ) -> Result<Option<T>, ParseError> {
        let mut query_clone = self.clone();
        query_clone.limit(1);
        let results: Vec<T> = query_clone.find(client).await?;
        Ok(results.into_iter().next())
    }

    /// Counts the number of objects that match this query.
    pub async fn count(&self, client: &ParseClient) -> Result<u64, ParseError> {
        let mut query_clone = self.clone();
        query_clone.limit(0); // Limit 0 is for count
        query_clone.order = None;

        let endpoint = format!("classes/{}", query_clone.class_name);
        let mut params = query_clone.build_query_params();
        params.push(("count".to_string(), "1".to_string()));

        let response_wrapper: CountResponse =
            client._get_with_url_params(&endpoint, &params).await?;
        Ok(response_wrapper.count)
    }
}

impl ParseClient {
    /// Executes a query and returns `ParseObject`s tagged with the query's class.
    pub async fn find_objects(&self, query: &ParseQuery) -> Result<Vec<ParseObject>, ParseError> {
        let mut objects: Vec<ParseObject> = query.find(self).await?;
        for object in objects.iter_mut() {
            object.class_name = query.class_name().to_string();
        }
        Ok(objects)
    }

    /// Replays an opaque query string (as produced by
    /// [`ParseQuery::to_query_string`] or saved by the user) against a class.
    pub async fn find_with_query_string(
        &self,
        class_name: &str,
        query_string: &str,
    ) -> Result<Vec<ParseObject>, ParseError> {
        crate::schema::validate_class_name(class_name)?;
        let endpoint = format!("classes/{}", class_name);
        let response: FindResponse<ParseObject> =
            self._get_with_query_string(&endpoint, query_string).await?;
        Ok(response
            .results
            .into_iter()
            .map(|mut object| {
                object.class_name = class_name.to_string();
                object
            })
            .collect())
    }

    /// Number of objects in a class.
    pub async fn count_objects(&self, class_name: &str) -> Result<u64, ParseError> {
        ParseQuery::new(class_name).count(self).await
    }
}

// Appends to a comma-separated list, skipping keys already present.
fn merge_csv(current: Option<String>, additions: &[&str]) -> String {
    let mut parts: Vec<String> = current
        .unwrap_or_default()
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    for key in additions {
        if !key.is_empty() && !parts.iter().any(|p| p == key) {
            parts.push(key.to_string());
        }
    }
    parts.join(",")
}

#[derive(Debug, Deserialize)]
struct FindResponse<T> {
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}
