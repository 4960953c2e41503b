use serde::{Deserialize, Serialize};

/// Represents a Pointer to another Parse object.
/// Pointers are used to create relationships between objects.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Pointer {
    #[serde(rename = "__type")]
    pub __type: String, // Should always be "Pointer"
    #[serde(rename = "className")]
    pub class_name: String,
    #[serde(rename = "objectId")]
    pub object_id: String,
}

impl Pointer {
    /// Creates a new Pointer.
    pub fn new(class_name: impl Into<String>, object_id: impl Into<String>) -> Self {
        Pointer {
            __type: "Pointer".to_string(),
            class_name: class_name.into(),
            object_id: object_id.into(),
        }
    }
}

/// Represents a relational operation (AddRelation, RemoveRelation).
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct RelationOp<'a, T>
where
    T: Serialize,
{
    #[serde(rename = "__op")]
    op_type: &'static str,
    objects: &'a [T],
}

impl<'a, T> RelationOp<'a, T>
where
    T: Serialize,
{
    pub fn add(objects: &'a [T]) -> Self {
        RelationOp {
            op_type: "AddRelation",
            objects,
        }
    }

    pub fn remove(objects: &'a [T]) -> Self {
        RelationOp {
            op_type: "RemoveRelation",
            objects,
        }
    }
}

/// Represents a Parse Relation field on an object.
/// The related objects themselves are only reachable through a `$relatedTo` query.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ParseRelation {
    #[serde(rename = "__type")]
    pub __type: String, // Should always be "Relation"
    #[serde(rename = "className")]
    pub class_name: String, // The target class of the relation
}

impl ParseRelation {
    pub fn new(class_name: impl Into<String>) -> Self {
        ParseRelation {
            __type: "Relation".to_string(),
            class_name: class_name.into(),
        }
    }
}

/// Represents the `Bytes` wire type: base64 content carried inline.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ParseBytes {
    #[serde(rename = "__type")]
    pub __type: String, // Should always be "Bytes"
    pub base64: String,
}
