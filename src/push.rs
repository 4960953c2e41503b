// src/push.rs

use crate::query::ParseQuery;
use crate::types::ParseDate;
use crate::{ParseClient, ParseError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The payload delivered to devices. `extra` carries any custom keys.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct PushData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// A number, or `"Increment"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(rename = "content-available", skip_serializing_if = "Option::is_none")]
    pub content_available: Option<u8>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A `POST /push` request. Target devices either by channel or by an
/// installation query; with neither, every installation receives it.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct PushNotification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<String>>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Map<String, Value>>,
    pub data: PushData,
    /// ISO 8601 time to deliver at; requires scheduled push support.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<String>,
}

impl PushNotification {
    pub fn alert(message: impl Into<String>) -> Self {
        PushNotification {
            data: PushData {
                alert: Some(message.into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn to_channels(mut self, channels: &[&str]) -> Self {
        self.channels = Some(channels.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Targets the installations matched by `query` (a `_Installation` query).
    pub fn to_installations(mut self, query: &ParseQuery) -> Self {
        self.where_clause = Some(query.conditions().clone());
        self
    }

    pub fn badge(mut self, badge: Value) -> Self {
        self.data.badge = Some(badge);
        self
    }

    pub fn sound(mut self, sound: impl Into<String>) -> Self {
        self.data.sound = Some(sound.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.data.title = Some(title.into());
        self
    }

    pub fn schedule(mut self, at: DateTime<Utc>) -> Self {
        self.push_time = Some(ParseDate::from_datetime(at).iso);
        self
    }

    pub fn expire(mut self, at: DateTime<Utc>) -> Self {
        self.expiration_time = Some(ParseDate::from_datetime(at).iso);
        self
    }

    fn validate(&self) -> Result<(), ParseError> {
        let data = &self.data;
        if data.alert.as_deref().unwrap_or_default().is_empty()
            && data.title.as_deref().unwrap_or_default().is_empty()
            && data.badge.is_none()
            && data.sound.is_none()
            && data.content_available.is_none()
            && data.extra.is_empty()
        {
            return Err(ParseError::InvalidInput(
                "A push needs a payload: alert, title, badge, sound or custom data".to_string(),
            ));
        }
        if self.channels.is_some() && self.where_clause.is_some() {
            return Err(ParseError::InvalidInput(
                "Target a push by channels or by query, not both".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug)]
struct PushResponse {
    result: bool,
}

impl ParseClient {
    /// `POST /push`. Succeeds once the server has accepted the push for delivery.
    pub async fn send_push(&self, notification: &PushNotification) -> Result<(), ParseError> {
        notification.validate()?;
        let response: PushResponse = self.post("push", notification).await?;
        if response.result {
            Ok(())
        } else {
            Err(ParseError::UnexpectedResponse(
                "Server did not accept the push".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn serializes_channel_push() {
        let push = PushNotification::alert("Hello")
            .to_channels(&["news"])
            .badge(json!("Increment"))
            .sound("default");
        assert_eq!(
            serde_json::to_value(&push).unwrap(),
            json!({
                "channels": ["news"],
                "data": {"alert": "Hello", "badge": "Increment", "sound": "default"}
            })
        );
    }

    #[test]
    fn serializes_query_push_with_schedule() {
        let mut query = ParseQuery::new("_Installation");
        query.equal_to("deviceType", "ios");
        let push = PushNotification::alert("Hi")
            .to_installations(&query)
            .schedule(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
        let body = serde_json::to_value(&push).unwrap();
        assert_eq!(body["where"], json!({"deviceType": "ios"}));
        assert_eq!(body["push_time"], "2030-01-01T00:00:00.000Z");
        assert!(body.get("channels").is_none());
    }

    #[test]
    fn validation() {
        assert!(PushNotification::default().validate().is_err());
        let mut query = ParseQuery::new("_Installation");
        query.exists("deviceToken");
        let both = PushNotification::alert("x")
            .to_channels(&["a"])
            .to_installations(&query);
        assert!(both.validate().is_err());
        assert!(PushNotification::alert("x").validate().is_ok());
    }

    #[test]
    fn badge_only_push_is_valid() {
        let push = PushNotification::default().badge(json!(0));
        assert!(push.validate().is_ok());
        assert_eq!(
            serde_json::to_value(&push).unwrap(),
            json!({"data": {"badge": 0}})
        );
        assert!(PushNotification::alert("").validate().is_err());
    }
}
