//! Batch execution through the helper jar.
//!
//! The whole queue is serialized to one JSON file and handed to a single
//! `hadoop jar` invocation that performs every operation in one JVM pass.
//! This is the only strategy that works for non-HDFS Hadoop-compatible
//! filesystems, and the fallback when WebHDFS is unavailable.

use std::path::PathBuf;

use chrono::Utc;
use snafu::{ensure, OptionExt, ResultExt, Snafu};
use stackable_hdfs_resource::HdfsResource;
use tracing::{debug, info};

use crate::{
    config::ReconcilerConfig,
    hadoop::{self, CommandRunner, HadoopCommand, ProcessRunner},
    kerberos,
};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("a user must be configured to run the jar batch"))]
    UserNotConfigured,

    #[snafu(display("no helper jar is configured"))]
    JarNotConfigured,

    #[snafu(display("failed to serialize the batch"))]
    SerializeBatch { source: serde_json::Error },

    #[snafu(display("failed to write batch file {path:?}"))]
    WriteBatchFile {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("Kerberos login failed"))]
    Kerberos { source: kerberos::Error },

    #[snafu(display("jar batch invocation failed"))]
    RunJar { source: hadoop::Error },
}

pub struct JarBatchExecutor<'a> {
    config: &'a ReconcilerConfig,
    runner: Box<dyn CommandRunner>,
}

impl<'a> JarBatchExecutor<'a> {
    pub fn new(config: &'a ReconcilerConfig) -> Self {
        Self {
            config,
            runner: Box::new(ProcessRunner),
        }
    }

    #[cfg(test)]
    fn with_runner(config: &'a ReconcilerConfig, runner: Box<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    pub async fn run(&self, batch: &[HdfsResource]) -> Result<()> {
        ensure!(!self.config.user.is_empty(), UserNotConfiguredSnafu);
        let jar = self.config.jar_path.as_ref().context(JarNotConfiguredSnafu)?;

        let json = serde_json::to_vec_pretty(batch).context(SerializeBatchSnafu)?;
        let batch_file = self.config.working_dir.join(format!(
            "hdfs_resources_{}.json",
            Utc::now().timestamp_millis()
        ));
        tokio::fs::create_dir_all(&self.config.working_dir)
            .await
            .with_context(|_| WriteBatchFileSnafu {
                path: self.config.working_dir.clone(),
            })?;
        // The batch file is kept after the run so operators can inspect what
        // was requested.
        tokio::fs::write(&batch_file, json)
            .await
            .with_context(|_| WriteBatchFileSnafu {
                path: batch_file.clone(),
            })?;

        kerberos::kinit(self.config).await.context(KerberosSnafu)?;

        let command = HadoopCommand::jar(self.config, jar, &batch_file);
        info!(%command, resources = batch.len(), "running jar batch");
        let output = self.runner.run(&command).await.context(RunJarSnafu)?;
        hadoop::ensure_success(&command, &output).context(RunJarSnafu)?;
        debug!(stdout = %output.stdout, "jar batch finished");

        Ok(())
    }
}
