// src/server.rs

use crate::{ParseClient, ParseError};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// The `/serverInfo` response: version plus feature flags grouped by area
/// (`push`, `schemas`, `logs`, ...).
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub parse_server_version: String,
    #[serde(default)]
    pub features: HashMap<String, Map<String, Value>>,
}

impl ServerInfo {
    /// Whether `features.<group>.<feature>` is `true`. Missing flags count as unsupported.
    pub fn supports(&self, group: &str, feature: &str) -> bool {
        self.features
            .get(group)
            .and_then(|flags| flags.get(feature))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Push needs a configured push adapter on the server.
    pub fn can_push(&self) -> bool {
        self.supports("push", "immediatePush")
    }

    pub fn can_schedule_push(&self) -> bool {
        self.supports("push", "scheduledPush")
    }
}

impl ParseClient {
    /// `GET /serverInfo`
    pub async fn server_info(&self) -> Result<ServerInfo, ParseError> {
        self.get("serverInfo").await
    }
}
