pub mod constants;
pub mod ignore;
pub mod path;

use serde::{Deserialize, Serialize};
use strum::Display;

/// The kind of filesystem object a resource declares.
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResourceType {
    File,
    Directory,
}

/// What should happen to the declared object when the batch runs.
///
/// `Execute` does not describe a filesystem object; a manifest entry with
/// this action flushes everything queued so far.
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResourceAction {
    Create,
    Delete,
    Execute,
}

/// One desired filesystem object.
///
/// The serialized form doubles as the manifest entry format and as the wire
/// format consumed by the batch helper jar, so the field names follow the
/// jar's JSON contract (including the historical `changePermissionforParents`
/// and `dfs_type` spellings).
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HdfsResource {
    /// Logical HDFS path; normalized before queuing.
    pub target: String,

    #[serde(rename = "type")]
    pub ty: ResourceType,

    pub action: ResourceAction,

    /// Local path whose content is uploaded to `target`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Octal permission bits, e.g. `"0755"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(default)]
    pub recursive_chown: bool,

    #[serde(default)]
    pub recursive_chmod: bool,

    #[serde(default, rename = "changePermissionforParents")]
    pub change_permissions_for_parents: bool,

    /// When false, a target that already exists is considered externally
    /// managed and is never touched, not even its permissions.
    #[serde(default = "default_true")]
    pub manage_if_exists: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub replace_existing_files: bool,

    /// Filesystem type marker forwarded to the helper jar; stamped from the
    /// cluster configuration when left empty.
    #[serde(default, rename = "dfs_type")]
    pub dfs_type: String,
}

fn default_true() -> bool {
    true
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}
