use parse_admin::{ClientConfig, ParseClient, ParseError, ParseObject, ParseQuery};
use serde_json::Value;
use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

fn initialize_logger_once() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub mod shared {
    use super::*;

    // Client for tests that talk to a live server. Returns None (and the test
    // passes trivially) unless PARSE_SERVER_URL, PARSE_APP_ID and
    // PARSE_MASTER_KEY are set, directly or through a .env file.
    #[allow(dead_code)]
    pub fn live_client() -> Option<ParseClient> {
        initialize_logger_once();
        let config = match ClientConfig::from_env() {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Skipping live server test: {}", e);
                return None;
            }
        };
        Some(ParseClient::from_config(&config).expect("Failed to create Parse client for tests"))
    }

    #[allow(dead_code)]
    pub fn generate_unique_classname(base: &str) -> String {
        use rand::distributions::Alphanumeric;
        use rand::{thread_rng, Rng};
        let suffix: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(10)
            .map(char::from)
            .collect();
        format!("{}_{}", base, suffix)
    }

    // Creates an object and fetches it back so tests see server-filled fields.
    #[allow(dead_code)]
    pub async fn create_test_object(
        client: &ParseClient,
        class_name: &str,
        data: Value,
    ) -> Result<ParseObject, ParseError> {
        let created = client.create_object(class_name, &data).await?;
        client.retrieve_object(class_name, &created.object_id).await
    }

    // Best-effort removal of a test class and its rows.
    #[allow(dead_code)]
    pub async fn cleanup_test_class(client: &ParseClient, class_name: &str) {
        match ParseQuery::new(class_name)
            .find::<ParseObject>(client)
            .await
        {
            Ok(objects) => {
                for obj in objects {
                    if let Some(ref obj_id) = obj.object_id {
                        let _ = client.delete_object(class_name, obj_id).await;
                    }
                }
            }
            Err(e) => {
                eprintln!("Error querying class {} for cleanup: {:?}", class_name, e);
            }
        }
        let _ = client.delete_class_schema(class_name).await;
    }
}
