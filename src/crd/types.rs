//! Shared types used across the Atlas CRDs

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn default_messaging_replicas() -> i32 {
    1
}

/// Sizing for the managed messaging cluster
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessagingConfig {
    /// Broker replica count
    #[serde(default = "default_messaging_replicas")]
    pub replicas: i32,

    /// Pin the broker version; the messaging operator default applies when
    /// unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            replicas: default_messaging_replicas(),
            version: None,
        }
    }
}

/// Action counts from one reconciliation cycle
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CycleSummary {
    pub created: i32,
    pub updated: i32,
    pub deleted: i32,
    pub unchanged: i32,
    pub failed: i32,
}

/// Status condition following Kubernetes API conventions
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition (e.g., "Ready", "Degraded")
    #[serde(rename = "type")]
    pub type_: String,
    /// Status of the condition: "True", "False", or "Unknown"
    pub status: String,
    /// Last time the condition transitioned
    pub last_transition_time: String,
    /// Machine-readable reason for the condition
    pub reason: String,
    /// Human-readable message
    pub message: String,
}

impl Condition {
    /// Create a new Ready condition
    pub fn ready(status: bool, reason: &str, message: &str) -> Self {
        Self {
            type_: "Ready".to_string(),
            status: if status { "True" } else { "False" }.to_string(),
            last_transition_time: Utc::now().to_rfc3339(),
            reason: reason.to_string(),
            message: message.to_string(),
        }
    }
}
