use parse_admin::schema::{ClassLevelPermissionsSchema, FieldSchema, FieldType};
use parse_admin::ParseError;
use serde_json::json;
use std::collections::HashMap;

mod admin_test_utils;
use admin_test_utils::shared::{cleanup_test_class, generate_unique_classname, live_client};

fn open_clp() -> ClassLevelPermissionsSchema {
    let everyone: HashMap<String, bool> = [("*".to_string(), true)].into_iter().collect();
    ClassLevelPermissionsSchema {
        find: Some(everyone.clone()),
        get: Some(everyone.clone()),
        create: Some(everyone.clone()),
        update: Some(everyone.clone()),
        delete: Some(everyone.clone()),
        add_field: Some(everyone),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_inspect_and_delete_class_schema() {
    let Some(client) = live_client() else { return };
    let class_name = generate_unique_classname("SchemaLifecycle");

    let mut fields = HashMap::new();
    fields.insert("title".to_string(), FieldSchema::new(FieldType::String));
    fields.insert(
        "owner".to_string(),
        FieldSchema::new(FieldType::Pointer).with_target_class("_User"),
    );
    fields.insert(
        "fans".to_string(),
        FieldSchema::new(FieldType::Relation).with_target_class("_User"),
    );

    let created = client
        .create_class_schema(&class_name, &fields, Some(&open_clp()))
        .await
        .expect("Failed to create class schema");
    assert_eq!(created.class_name, class_name);
    // objectId, createdAt, updatedAt and ACL are added by the server.
    assert_eq!(created.fields.len(), fields.len() + 4);
    assert_eq!(created.target_class("owner"), Some("_User"));

    let names = created.field_names();
    assert_eq!(&names[..4], &["objectId", "createdAt", "updatedAt", "ACL"]);
    assert_eq!(&names[4..], &["fans", "owner", "title"]);

    let updated = client
        .add_field(&class_name, "score", &FieldSchema::new(FieldType::Number))
        .await
        .expect("Failed to add field");
    assert_eq!(updated.field_type("score"), Some(&FieldType::Number));

    let updated = client
        .delete_field(&class_name, "title")
        .await
        .expect("Failed to delete field");
    assert!(updated.field("title").is_none());

    let all = client.get_all_schemas().await.expect("Failed to list schemas");
    assert!(all.results.iter().any(|s| s.class_name == class_name));

    client
        .delete_class_schema(&class_name)
        .await
        .expect("Failed to delete empty class");
    match client.get_class_schema(&class_name).await {
        Err(ParseError::InvalidClassName(_)) | Err(ParseError::ObjectNotFound(_)) => {}
        other => panic!("Expected the class to be gone, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_non_empty_class_requires_purge() {
    let Some(client) = live_client() else { return };
    let class_name = generate_unique_classname("PurgeTarget");

    for i in 0..3 {
        client
            .create_object(&class_name, &json!({ "n": i }))
            .await
            .expect("Failed to seed object");
    }

    let err = client
        .delete_class_schema(&class_name)
        .await
        .expect_err("Deleting a non-empty class should fail");
    assert!(err.is_class_not_empty(), "unexpected error: {:?}", err);

    // Declining leaves everything in place.
    let declined = client
        .delete_class_schema_with_purge(&class_name, |_| false)
        .await
        .expect_err("Declined purge should return the original error");
    assert!(declined.is_class_not_empty());
    assert_eq!(client.count_objects(&class_name).await.unwrap(), 3);

    let mut asked = false;
    let purged = client
        .delete_class_schema_with_purge(&class_name, |e| {
            asked = e.is_class_not_empty();
            true
        })
        .await
        .expect("Purge and retry should succeed");
    assert!(asked);
    assert_eq!(purged, 3);
    assert!(client.get_class_schema(&class_name).await.is_err());

    cleanup_test_class(&client, &class_name).await;
}

#[tokio::test]
async fn test_purge_is_not_offered_for_empty_class() {
    let Some(client) = live_client() else { return };
    let class_name = generate_unique_classname("EmptyPurge");

    client
        .create_class_schema(&class_name, &HashMap::new(), None)
        .await
        .expect("Failed to create class schema");

    let purged = client
        .delete_class_schema_with_purge(&class_name, |_| panic!("confirmation not expected"))
        .await
        .expect("Empty class should delete directly");
    assert_eq!(purged, 0);
}
