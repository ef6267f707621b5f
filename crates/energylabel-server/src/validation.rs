//! Inbound payload validation for `POST /log`.
//!
//! The warehouse itself trusts its `Run` values; this module is the
//! boundary that re-checks a body coming straight off the network before it
//! ever reaches the core, independent of whatever validation the browser
//! extension already performed client-side.

use energylabel_core::Run;
use serde::Deserialize;
use validator::Validate;

/// The wire shape of one record in a `/log` body, with the constraints the
/// warehouse's columns assume.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RunPayload {
    #[validate(range(min = 0, max = 100))]
    pub score: i64,
    #[validate(range(min = 100, max = 599))]
    pub status_code: i64,
    #[serde(default)]
    pub error_message: Option<String>,
    #[validate(length(min = 1))]
    pub plugin_version: String,
    #[validate(length(min = 1))]
    pub plugin_name: String,
    #[validate(length(min = 1))]
    pub extension_version: String,
    #[validate(length(min = 1))]
    pub browser_version: String,
    #[validate(length(min = 1))]
    pub browser_name: String,
    #[validate(length(min = 1))]
    pub path: String,
    #[validate(length(min = 1))]
    pub url: String,
}

impl From<RunPayload> for Run {
    fn from(payload: RunPayload) -> Self {
        Run {
            score: payload.score,
            status_code: payload.status_code,
            error_message: payload.error_message,
            plugin_version: payload.plugin_version,
            plugin_name: payload.plugin_name,
            extension_version: payload.extension_version,
            browser_version: payload.browser_version,
            browser_name: payload.browser_name,
            path: payload.path,
            url: payload.url,
        }
    }
}

/// A `/log` body is either a single record or an array of records.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}
