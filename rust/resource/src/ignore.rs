//! Path sets consulted before touching a target.
//!
//! Two sets exist at runtime: the ignore list (targets that must never be
//! reconciled, loaded from a newline-separated file) and the immutable paths
//! (targets whose ownership and permissions must never be altered, taken from
//! the cluster configuration). Membership tests normalize their argument, so
//! `hdfs://nn/apps/x` and `/apps/x` are the same entry.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use snafu::{ResultExt, Snafu};

use crate::path;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to read path list {file:?}"))]
    ReadPathList {
        source: std::io::Error,
        file: PathBuf,
    },
}

#[derive(Clone, Debug, Default)]
pub struct PathSet {
    paths: HashSet<String>,
}

impl PathSet {
    /// Loads a newline-separated path list. Blank lines and `#` comments are
    /// skipped.
    pub fn from_file(file: impl AsRef<Path>) -> Result<Self> {
        let file = file.as_ref();
        let content = fs::read_to_string(file).context(ReadPathListSnafu { file })?;
        Ok(Self::from_lines(&content))
    }

    pub fn from_lines(content: &str) -> Self {
        Self::from_paths(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            paths: paths
                .into_iter()
                .map(|p| path::normalize(p.as_ref()))
                .collect(),
        }
    }

    pub fn contains(&self, target: &str) -> bool {
        self.paths.contains(&path::normalize(target))
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }
}
