use crate::error::ParseError;

use reqwest::{Method, Response as HttpResponse, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

impl crate::ParseClient {
    // Turns an HTTP response into either the decoded body or a ParseError.
    pub(crate) async fn _send_and_process_response<R: DeserializeOwned + Send + 'static>(
        &self,
        response: HttpResponse,
        endpoint_context: &str,
    ) -> Result<R, ParseError> {
        let status = response.status();
        let response_url = response.url().to_string();

        if log::log_enabled!(log::Level::Debug) {
            log::debug!("--- Parse Response ---");
            log::debug!("Status: {}", status);
            for (name, value) in response.headers() {
                log::debug!("Header: {}: {:?}", name, value);
            }
        }

        let response_text = response.text().await.map_err(ParseError::ReqwestError)?;

        if status.is_success() {
            // DELETE answers `{}`; some proxies turn it into 204 with no body.
            let body = if status == StatusCode::NO_CONTENT || response_text.trim().is_empty() {
                "{}"
            } else {
                response_text.as_str()
            };
            log::debug!("Request successful. Response body: {}", body);
            serde_json::from_str::<R>(body).map_err(|e| {
                log::error!(
                    "JSON Deserialization failed for successful response from '{}'. Status: {}. Error: {}. Body: {}",
                    response_url,
                    status,
                    e,
                    body
                );
                ParseError::JsonDeserializationFailed(format!(
                    "Failed to deserialize response for '{}': {}. Body: {}",
                    endpoint_context, e, body
                ))
            })
        } else {
            log::warn!(
                "Request to '{}' failed with status {}. Response body: {}",
                response_url,
                status,
                response_text
            );
            let parsed_body: Value = match serde_json::from_str::<Value>(&response_text) {
                Ok(json_val @ Value::Object(_)) => json_val,
                _ => {
                    let message = if response_text.is_empty() {
                        format!("HTTP Error {}", status)
                    } else {
                        response_text.chars().take(200).collect::<String>()
                    };
                    serde_json::json!({ "code": status.as_u16(), "error": message })
                }
            };
            Err(ParseError::from_response(status.as_u16(), parsed_body))
        }
    }

    // Public HTTP method wrappers for endpoints without a typed helper.
    pub async fn get<R: DeserializeOwned + Send + 'static>(
        &self,
        endpoint: &str,
    ) -> Result<R, ParseError> {
        self._request(Method::GET, endpoint, None::<&Value>).await
    }

    pub async fn post<T: Serialize + Send + Sync, R: DeserializeOwned + Send + 'static>(
        &self,
        endpoint: &str,
        data: &T,
    ) -> Result<R, ParseError> {
        self._request(Method::POST, endpoint, Some(data)).await
    }

    pub async fn put<T: Serialize + Send + Sync, R: DeserializeOwned + Send + 'static>(
        &self,
        endpoint: &str,
        data: &T,
    ) -> Result<R, ParseError> {
        self._request(Method::PUT, endpoint, Some(data)).await
    }

    pub async fn delete<R: DeserializeOwned + Send + 'static>(
        &self,
        endpoint: &str,
    ) -> Result<R, ParseError> {
        self._request(Method::DELETE, endpoint, None::<&Value>).await
    }
}
