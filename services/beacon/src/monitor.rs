//! Monitor configuration forms and the payload the backend expects

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::BeaconError;

/// Check frequencies offered by the dashboard, in seconds
pub const FREQUENCIES: [u64; 6] = [10, 20, 60, 300, 600, 1800];

/// HTTP method a monitor uses against its target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MonitorMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl fmt::Display for MonitorMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorMethod::Get => write!(f, "GET"),
            MonitorMethod::Post => write!(f, "POST"),
            MonitorMethod::Put => write!(f, "PUT"),
            MonitorMethod::Delete => write!(f, "DELETE"),
            MonitorMethod::Patch => write!(f, "PATCH"),
        }
    }
}

/// One request header row as edited in the form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
}

/// Create/edit form as submitted by the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorForm {
    #[serde(default)]
    pub friendly_name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub method: MonitorMethod,
    #[serde(default)]
    pub headers: Vec<HeaderEntry>,
    #[serde(default)]
    pub body: String,
    #[serde(default = "default_frequency")]
    pub frequency: u64,
    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
    #[serde(default = "default_expected_code")]
    pub expected_code: u16,
}

impl Default for MonitorForm {
    fn default() -> Self {
        Self {
            friendly_name: String::new(),
            url: String::new(),
            method: MonitorMethod::Get,
            headers: Vec::new(),
            body: String::new(),
            frequency: default_frequency(),
            timeout: default_timeout_ms(),
            expected_code: default_expected_code(),
        }
    }
}

/// Monitor body sent to `POST /monitor` and `PUT /monitor/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorPayload {
    pub friendly_name: String,
    pub url: String,
    pub method: MonitorMethod,
    /// Empty, or a single object holding every header
    pub headers: Vec<BTreeMap<String, String>>,
    pub body: String,
    pub frequency: u64,
    pub timeout: u64,
    pub expected_code: u16,
}

impl MonitorForm {
    /// Validate the form and fold its header rows into the backend shape
    pub fn into_payload(self) -> crate::Result<MonitorPayload> {
        if self.friendly_name.trim().is_empty() || self.url.trim().is_empty() {
            return Err(BeaconError::Validation(
                "Please provide a name and URL.".to_string(),
            ));
        }
        if !FREQUENCIES.contains(&self.frequency) {
            return Err(BeaconError::Validation(format!(
                "Unsupported check frequency: {}s",
                self.frequency
            )));
        }
        if self.timeout == 0 {
            return Err(BeaconError::Validation(
                "Timeout must be greater than zero.".to_string(),
            ));
        }
        if !(100..=599).contains(&self.expected_code) {
            return Err(BeaconError::Validation(format!(
                "Invalid expected status code: {}",
                self.expected_code
            )));
        }

        let headers = if self.headers.is_empty() {
            Vec::new()
        } else {
            let folded: BTreeMap<String, String> = self
                .headers
                .into_iter()
                .filter(|h| !h.key.is_empty())
                .map(|h| (h.key, h.value))
                .collect();
            vec![folded]
        };

        Ok(MonitorPayload {
            friendly_name: self.friendly_name,
            url: self.url,
            method: self.method,
            headers,
            body: self.body,
            frequency: self.frequency,
            timeout: self.timeout,
            expected_code: self.expected_code,
        })
    }
}

fn default_frequency() -> u64 {
    60
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_expected_code() -> u16 {
    200
}
