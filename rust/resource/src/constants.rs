pub const APP_NAME: &str = "hdfs-reconciler";

pub const WEBHDFS_API_PREFIX: &str = "/webhdfs/v1";

pub const OP_GET_FILE_STATUS: &str = "GETFILESTATUS";
pub const OP_LIST_STATUS: &str = "LISTSTATUS";
pub const OP_GET_CONTENT_SUMMARY: &str = "GETCONTENTSUMMARY";
pub const OP_MKDIRS: &str = "MKDIRS";
pub const OP_CREATE: &str = "CREATE";
pub const OP_DELETE: &str = "DELETE";
pub const OP_SET_OWNER: &str = "SETOWNER";
pub const OP_SET_PERMISSION: &str = "SETPERMISSION";

// Applying ownership or permissions recursively over REST costs one round
// trip per entry. Above these counts a single `hadoop fs` invocation is
// cheaper than the per-entry calls.
pub const MAX_FILES_FOR_RECURSIVE_REST: u64 = 1000;
pub const MAX_DIRECTORIES_FOR_RECURSIVE_REST: u64 = 250;

pub const DEFAULT_NAME_NODE_HTTP_PORT: u16 = 9870;
pub const DEFAULT_NAME_NODE_HTTPS_PORT: u16 = 9871;
