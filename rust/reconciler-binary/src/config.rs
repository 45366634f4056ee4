use std::path::{Path, PathBuf};

use serde::Deserialize;
use snafu::{ResultExt, Snafu};
use strum::Display;
use url::Url;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to read config file {path:?}"))]
    ReadConfigFile {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to parse config file {path:?}"))]
    ParseConfigFile {
        source: serde_json::Error,
        path: PathBuf,
    },
}

/// The kind of filesystem `fs.defaultFS` points at.
///
/// Hadoop-compatible filesystems that are not HDFS (cloud object stores and
/// the like) do not expose WebHDFS uniformly, so they are always reconciled
/// through the helper jar.
#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE")]
pub enum DfsType {
    #[default]
    Hdfs,
    Hcfs,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcilerConfig {
    /// The cluster's `fs.defaultFS`, e.g. `hdfs://mycluster:8020`.
    pub default_fs: String,

    #[serde(default)]
    pub dfs_type: DfsType,

    #[serde(default = "default_true")]
    pub webhdfs_enabled: bool,

    /// Namenode HTTP(S) addresses, tried in order. Entries may be given as
    /// `host:port` or as full URLs.
    #[serde(default)]
    pub namenode_http_endpoints: Vec<String>,

    #[serde(default)]
    pub https_enabled: bool,

    /// The user all filesystem operations run as, typically the HDFS
    /// superuser.
    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub security_enabled: bool,

    #[serde(default)]
    pub keytab: Option<PathBuf>,

    #[serde(default)]
    pub principal: Option<String>,

    #[serde(default = "default_hadoop_bin")]
    pub hadoop_bin: PathBuf,

    #[serde(default)]
    pub hadoop_conf_dir: Option<PathBuf>,

    /// The helper jar performing a whole batch in one JVM invocation.
    #[serde(default)]
    pub jar_path: Option<PathBuf>,

    /// Where batch files are written; they are kept after the run.
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// Newline-separated list of paths that must never be reconciled.
    #[serde(default)]
    pub ignore_file: Option<PathBuf>,

    /// Paths whose ownership and permissions are never altered.
    #[serde(default)]
    pub immutable_paths: Vec<String>,
}

impl ReconcilerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).context(ReadConfigFileSnafu { path })?;
        serde_json::from_str(&content).context(ParseConfigFileSnafu { path })
    }

    /// Whether `fs.defaultFS` carries an `hdfs`-family scheme (`hdfs`,
    /// `hdfs+viewfs` style variants included).
    pub fn default_fs_is_hdfs(&self) -> bool {
        Url::parse(&self.default_fs)
            .map(|url| url.scheme().starts_with("hdfs"))
            .unwrap_or(false)
    }
}

fn default_true() -> bool {
    true
}

fn default_hadoop_bin() -> PathBuf {
    PathBuf::from("hadoop")
}

fn default_working_dir() -> PathBuf {
    PathBuf::from("/tmp")
}
