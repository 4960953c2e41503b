// src/client.rs

use crate::config::ClientConfig;
use crate::error::ParseError;
use crate::profile::ServerProfile;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// The master-key client for administering one Parse Server application.
///
/// Every request carries the same three headers: `X-Parse-Application-Id`,
/// `X-Parse-Master-Key` and `Content-Type: application/json`. File uploads
/// replace the content type with the file's MIME type.
///
/// The server URL includes the mount path, e.g. `https://example.com/parse`;
/// endpoint paths such as `classes/GameScore` are appended to it.
///
/// ```rust,no_run
/// use parse_admin::ParseClient;
/// # use parse_admin::ParseError;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), ParseError> {
/// let client = ParseClient::new("http://localhost:1337/parse", "myAppId", "myMasterKey")?;
/// let info = client.server_info().await?;
/// println!("Parse Server {}", info.parse_server_version);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ParseClient {
    pub server_url: String,
    pub(crate) app_id: String,
    pub(crate) master_key: String,
    pub(crate) http_client: Client,
}

impl fmt::Debug for ParseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseClient")
            .field("server_url", &self.server_url)
            .field("app_id", &self.app_id)
            .field("master_key", &"<redacted>")
            .finish()
    }
}

impl ParseClient {
    /// Creates a new client.
    ///
    /// A URL without a scheme gets `https://`; a trailing `/` is dropped.
    /// Fails when the URL cannot serve as a base or when the credentials are
    /// not valid header values.
    pub fn new(server_url: &str, app_id: &str, master_key: &str) -> Result<Self, ParseError> {
        if app_id.is_empty() {
            return Err(ParseError::InvalidInput(
                "Application id cannot be empty".to_string(),
            ));
        }
        if master_key.is_empty() {
            return Err(ParseError::InvalidInput(
                "Master key cannot be empty".to_string(),
            ));
        }

        let server_url = normalize_server_url(server_url)?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            "X-Parse-Application-Id",
            HeaderValue::from_str(app_id).map_err(ParseError::InvalidHeaderValue)?,
        );
        let mut master_key_header =
            HeaderValue::from_str(master_key).map_err(ParseError::InvalidHeaderValue)?;
        master_key_header.set_sensitive(true);
        default_headers.insert("X-Parse-Master-Key", master_key_header);
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = Client::builder()
            .default_headers(default_headers)
            .build()
            .map_err(ParseError::ReqwestError)?;

        log::debug!("ParseClient initialized for {}", server_url);

        Ok(Self {
            server_url,
            app_id: app_id.to_string(),
            master_key: master_key.to_string(),
            http_client,
        })
    }

    /// Creates a client for a stored connection profile.
    pub fn from_profile(profile: &ServerProfile) -> Result<Self, ParseError> {
        Self::new(
            &profile.server_url,
            &profile.application_id,
            &profile.master_key,
        )
    }

    /// Creates a client from environment-derived configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ParseError> {
        Self::new(&config.server_url, &config.app_id, &config.master_key)
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Resolves an endpoint path (`classes/Foo/abc`) against the server URL.
    pub(crate) fn endpoint_url(&self, endpoint: &str) -> Result<Url, ParseError> {
        let full = format!("{}/{}", self.server_url, endpoint.trim_start_matches('/'));
        Url::parse(&full).map_err(|e| {
            ParseError::InvalidUrl(format!(
                "Failed to build URL for endpoint '{}' on '{}': {}",
                endpoint, self.server_url, e
            ))
        })
    }

    // GET with encoded URL parameters (queries, counts).
    pub(crate) async fn _get_with_url_params<R: DeserializeOwned + Send + 'static>(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<R, ParseError> {
        let mut full_url = self.endpoint_url(endpoint)?;
        if !params.is_empty() {
            let mut pairs = full_url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }

        log::debug!("Preparing request: Method=GET, URL={}", full_url);

        let response = self
            .http_client
            .get(full_url)
            .send()
            .await
            .map_err(ParseError::ReqwestError)?;
        self._send_and_process_response(response, endpoint).await
    }

    // GET with a prebuilt query string, used for saved queries.
    pub(crate) async fn _get_with_query_string<R: DeserializeOwned + Send + 'static>(
        &self,
        endpoint: &str,
        query_string: &str,
    ) -> Result<R, ParseError> {
        let mut full_url = self.endpoint_url(endpoint)?;
        let query_string = query_string.trim_start_matches('?');
        if !query_string.is_empty() {
            full_url.set_query(Some(query_string));
        }

        log::debug!("Preparing request: Method=GET, URL={}", full_url);

        let response = self
            .http_client
            .get(full_url)
            .send()
            .await
            .map_err(ParseError::ReqwestError)?;
        self._send_and_process_response(response, endpoint).await
    }

    // Central request method
    pub(crate) async fn _request<
        T: Serialize + Send + Sync + ?Sized,
        R: DeserializeOwned + Send + 'static,
    >(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&T>,
    ) -> Result<R, ParseError> {
        let full_url = self.endpoint_url(endpoint)?;

        log::debug!("Preparing request: Method={}, URL={}", method, full_url);

        let mut request_builder = self.http_client.request(method, full_url);

        if let Some(body_data) = body {
            let body_str = serde_json::to_string(body_data).map_err(ParseError::JsonError)?;
            log::debug!("Request body: {}", body_str);
            request_builder = request_builder.body(body_str);
        } else {
            log::debug!("Request body: None");
        }

        let response = request_builder
            .send()
            .await
            .map_err(ParseError::ReqwestError)?;
        self._send_and_process_response(response, endpoint).await
    }

    // Raw-body POST for file uploads.
    pub(crate) async fn _post_bytes<R: DeserializeOwned + Send + 'static>(
        &self,
        endpoint: &str,
        data: Vec<u8>,
        mime_type: &str,
    ) -> Result<R, ParseError> {
        let full_url = self.endpoint_url(endpoint)?;

        log::debug!(
            "Preparing upload: URL={}, Content-Type={}, Body=<binary data of size {}>",
            full_url,
            mime_type,
            data.len()
        );

        let response = self
            .http_client
            .post(full_url)
            .header(
                CONTENT_TYPE,
                HeaderValue::from_str(mime_type).map_err(ParseError::InvalidHeaderValue)?,
            )
            .body(data)
            .send()
            .await
            .map_err(ParseError::ReqwestError)?;
        self._send_and_process_response(response, endpoint).await
    }
}

/// Adds a scheme when missing and strips trailing slashes.
pub(crate) fn normalize_server_url(server_url: &str) -> Result<String, ParseError> {
    let trimmed = server_url.trim();
    if trimmed.is_empty() {
        return Err(ParseError::InvalidUrl("Server URL cannot be empty".to_string()));
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&with_scheme)?;
    if parsed.cannot_be_a_base() || parsed.host_str().is_none() {
        return Err(ParseError::InvalidUrl(format!(
            "'{}' cannot be used as a server URL (e.g. https://example.com/parse)",
            server_url
        )));
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_urls() {
        assert_eq!(
            normalize_server_url("example.com/parse/").unwrap(),
            "https://example.com/parse"
        );
        assert_eq!(
            normalize_server_url("http://localhost:1337/parse").unwrap(),
            "http://localhost:1337/parse"
        );
        assert_eq!(
            normalize_server_url("https://api.example.com").unwrap(),
            "https://api.example.com"
        );
        assert!(normalize_server_url("   ").is_err());
    }

    #[test]
    fn builds_endpoint_urls_under_mount_path() {
        let client = ParseClient::new("http://localhost:1337/parse/", "app", "master").unwrap();
        assert_eq!(
            client.endpoint_url("classes/GameScore").unwrap().as_str(),
            "http://localhost:1337/parse/classes/GameScore"
        );
        assert_eq!(
            client.endpoint_url("/schemas").unwrap().as_str(),
            "http://localhost:1337/parse/schemas"
        );
    }

    #[test]
    fn rejects_missing_credentials() {
        assert!(matches!(
            ParseClient::new("http://localhost:1337/parse", "", "master"),
            Err(ParseError::InvalidInput(_))
        ));
        assert!(matches!(
            ParseClient::new("http://localhost:1337/parse", "app", ""),
            Err(ParseError::InvalidInput(_))
        ));
        assert!(matches!(
            ParseClient::new("http://localhost:1337/parse", "app", "bad\nkey"),
            Err(ParseError::InvalidHeaderValue(_))
        ));
    }

    #[test]
    fn debug_output_hides_master_key() {
        let client = ParseClient::new("http://localhost:1337/parse", "app", "s3cret").unwrap();
        let printed = format!("{:?}", client);
        assert!(!printed.contains("s3cret"));
        assert!(printed.contains("<redacted>"));
    }
}
