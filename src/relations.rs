use crate::error::ParseError;
use crate::object::{ParseObject, UpdateObjectResponse};
use crate::query::ParseQuery;
use crate::types::RelationOp;
use crate::{ParseDate, Pointer};

use reqwest::Method;
use serde_json::json;

impl crate::ParseClient {
    /// Adds `targets` to the `relation_key` relation of the parent object.
    /// Returns the parent's new `updatedAt`.
    pub async fn add_to_relation(
        &self,
        parent: &Pointer,
        relation_key: &str,
        targets: &[Pointer],
    ) -> Result<ParseDate, ParseError> {
        self.apply_relation_op(parent, relation_key, targets, RelationOp::add(targets))
            .await
    }

    /// Removes `targets` from the `relation_key` relation of the parent object.
    pub async fn remove_from_relation(
        &self,
        parent: &Pointer,
        relation_key: &str,
        targets: &[Pointer],
    ) -> Result<ParseDate, ParseError> {
        self.apply_relation_op(parent, relation_key, targets, RelationOp::remove(targets))
            .await
    }

    async fn apply_relation_op(
        &self,
        parent: &Pointer,
        relation_key: &str,
        targets: &[Pointer],
        relation_op: RelationOp<'_, Pointer>,
    ) -> Result<ParseDate, ParseError> {
        if targets.is_empty() {
            return Err(ParseError::InvalidInput(
                "targets cannot be empty for a relation operation.".to_string(),
            ));
        }
        if parent.class_name.is_empty() || parent.object_id.is_empty() || relation_key.is_empty()
        {
            return Err(ParseError::InvalidInput(
                "parent class, parent object id, and relation_key cannot be empty.".to_string(),
            ));
        }

        let endpoint = format!("classes/{}/{}", parent.class_name, parent.object_id);
        let body = json!({ relation_key: relation_op });

        let response: UpdateObjectResponse =
            self._request(Method::PUT, &endpoint, Some(&body)).await?;
        Ok(response.updated_at)
    }

    /// Lists the members of a relation: the `target_class` objects in the
    /// `relation_key` relation of `parent`.
    pub async fn relation_members(
        &self,
        parent: &Pointer,
        relation_key: &str,
        target_class: &str,
        limit: Option<isize>,
    ) -> Result<Vec<ParseObject>, ParseError> {
        let mut query = ParseQuery::new(target_class);
        query.related_to(parent, relation_key);
        if let Some(limit) = limit {
            query.limit(limit);
        }
        self.find_objects(&query).await
    }
}
