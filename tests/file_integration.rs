// tests/file_integration.rs
use parse_admin::wire::DisplayValue;
use parse_admin::ParseFile;
use serde_json::json;

mod admin_test_utils;
use admin_test_utils::shared::{
    cleanup_test_class, create_test_object, generate_unique_classname, live_client,
};

#[tokio::test]
async fn test_upload_file_and_associate_with_object() {
    let Some(client) = live_client() else { return };
    let class_name = generate_unique_classname("FileHolder");

    let mut file = ParseFile::new(
        "test_upload.txt".to_string(),
        b"Hello, Parse File world!".to_vec(),
        "text/plain".to_string(),
    );
    let field = client.save_file(&mut file).await.expect("Failed to upload file");

    assert!(
        field.name.ends_with("test_upload.txt"),
        "Uploaded file name '{}' should end with the original file name",
        field.name
    );
    assert_eq!(file.url.as_deref(), Some(field.url.as_str()));
    assert_eq!(file.to_field(), Some(field.clone()));

    let object = create_test_object(&client, &class_name, json!({ "attachment": field }))
        .await
        .expect("Failed to create object with file");
    let schema = client.get_class_schema(&class_name).await.unwrap();
    match object.display(&schema, "attachment") {
        DisplayValue::File { name, url } => {
            assert_eq!(name, field.name);
            assert_eq!(url.as_deref(), Some(field.url.as_str()));
        }
        other => panic!("Expected a file, got {:?}", other),
    }

    cleanup_test_class(&client, &class_name).await;
}

#[tokio::test]
async fn test_delete_uploaded_file() {
    let Some(client) = live_client() else { return };
    let field = client
        .upload_file("to_delete.txt", b"short-lived".to_vec(), "text/plain")
        .await
        .expect("Failed to upload file");

    client
        .delete_file(&field.name)
        .await
        .expect("Failed to delete file");

    let fetched = reqwest::get(field.url.as_str())
        .await
        .expect("Failed to request deleted file");
    assert!(
        !fetched.status().is_success(),
        "Deleted file is still served with status {}",
        fetched.status()
    );

    let result = client.delete_file("").await;
    assert!(matches!(result, Err(parse_admin::ParseError::InvalidInput(_))));
}

#[tokio::test]
async fn test_empty_file_name_is_rejected_locally() {
    let Some(client) = live_client() else { return };
    let result = client.upload_file("", b"x".to_vec(), "text/plain").await;
    assert!(matches!(result, Err(parse_admin::ParseError::InvalidInput(_))));
}

#[tokio::test]
async fn test_server_info_reports_version() {
    let Some(client) = live_client() else { return };
    let info = client.server_info().await.expect("Failed to fetch server info");
    assert!(!info.parse_server_version.is_empty());
    assert!(info.supports("schemas", "addField") || info.features.is_empty());
}
