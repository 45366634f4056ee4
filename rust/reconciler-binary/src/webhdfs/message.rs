//! WebHDFS JSON response bodies.
//!
//! Shapes follow the REST API reference; wrapper structs mirror the
//! `{"FileStatus": {...}}` style envelopes the namenode returns.

use serde::Deserialize;
use strum::Display;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileStatusWrapper {
    pub file_status: FileStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileStatusesWrapper {
    pub file_statuses: FileStatuses,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileStatuses {
    pub file_status: Vec<FileStatus>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStatus {
    #[serde(rename = "type")]
    pub ty: FileStatusType,

    /// The entry name relative to the listed directory; empty for the
    /// object itself in a `GETFILESTATUS` response.
    #[serde(default)]
    pub path_suffix: String,

    pub owner: String,
    pub group: String,

    /// Octal permission bits without a leading zero, e.g. `"755"`.
    pub permission: String,

    #[serde(default)]
    pub length: u64,
}

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum FileStatusType {
    File,
    Directory,
}

#[derive(Debug, Deserialize)]
pub struct BooleanResponse {
    pub boolean: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContentSummaryWrapper {
    pub content_summary: ContentSummary,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
    pub directory_count: u64,
    pub file_count: u64,
}
