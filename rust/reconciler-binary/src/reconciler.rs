//! The pending queue and batch lifecycle.
//!
//! Callers declare desired state through `create_on_execute` /
//! `delete_on_execute`; nothing touches the cluster until `execute` drains
//! the queue. One strategy is selected per batch: filesystems without
//! uniform WebHDFS semantics (HCFS) and clusters without WebHDFS go through
//! the helper jar, everything else through per-resource REST calls.

use snafu::{ResultExt, Snafu};
use stackable_hdfs_resource::{ignore::PathSet, path, HdfsResource, ResourceAction};
use strum::Display;
use tracing::{debug, info, warn};

use crate::{
    config::{DfsType, ReconcilerConfig},
    jar_batch::JarBatchExecutor,
    kerberos,
    webhdfs::{self, WebHdfsExecutor},
};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("jar batch execution failed"))]
    JarBatch { source: crate::jar_batch::Error },

    #[snafu(display("Kerberos login failed"))]
    Kerberos { source: kerberos::Error },

    #[snafu(display("failed to build the WebHDFS client"))]
    BuildWebHdfsClient {
        source: webhdfs::client::Error,
    },

    #[snafu(display("WebHDFS execution failed"))]
    WebHdfs { source: webhdfs::Error },
}

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Strategy {
    #[strum(serialize = "jar batch")]
    JarBatch,
    #[strum(serialize = "WebHDFS")]
    WebHdfs,
}

/// Picks the executor for a whole batch. There is no partial selection.
pub fn select_strategy(config: &ReconcilerConfig) -> Strategy {
    if config.dfs_type == DfsType::Hcfs {
        return Strategy::JarBatch;
    }
    if config.webhdfs_enabled && config.default_fs_is_hdfs() {
        Strategy::WebHdfs
    } else {
        Strategy::JarBatch
    }
}

pub struct Reconciler {
    config: ReconcilerConfig,
    ignored: PathSet,
    queue: Vec<HdfsResource>,
}

impl Reconciler {
    pub fn new(config: ReconcilerConfig, ignored: PathSet) -> Self {
        Self {
            config,
            ignored,
            queue: Vec::new(),
        }
    }

    pub fn create_on_execute(&mut self, resource: HdfsResource) {
        self.enqueue(resource, ResourceAction::Create);
    }

    pub fn delete_on_execute(&mut self, resource: HdfsResource) {
        self.enqueue(resource, ResourceAction::Delete);
    }

    fn enqueue(&mut self, mut resource: HdfsResource, action: ResourceAction) {
        resource.target = path::normalize(&resource.target);
        if self.ignored.contains(&resource.target) {
            info!(path = %resource.target, "target is on the ignore list, skipping");
            return;
        }

        resource.action = action;
        if resource.dfs_type.is_empty() {
            resource.dfs_type = self.config.dfs_type.to_string();
        }
        debug!(path = %resource.target, action = %resource.action, "queued resource");
        self.queue.push(resource);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Drains the queue and converges the filesystem. A failure aborts the
    /// remaining batch; already-applied resources keep their new state and
    /// the caller is expected to re-run the whole reconciliation.
    pub async fn execute(&mut self) -> Result<()> {
        if self.queue.is_empty() {
            debug!("nothing queued, skipping execution");
            return Ok(());
        }

        let batch = std::mem::take(&mut self.queue);
        let strategy = select_strategy(&self.config);
        info!(%strategy, resources = batch.len(), "executing batch");

        match strategy {
            Strategy::JarBatch => JarBatchExecutor::new(&self.config)
                .run(&batch)
                .await
                .context(JarBatchSnafu),
            Strategy::WebHdfs => {
                if self.config.user.is_empty() {
                    warn!("no user is configured, WebHDFS calls will run unauthenticated");
                }
                kerberos::kinit(&self.config).await.context(KerberosSnafu)?;
                let executor =
                    WebHdfsExecutor::new(&self.config).context(BuildWebHdfsClientSnafu)?;
                executor.run(&batch).await.context(WebHdfsSnafu)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;
    use stackable_hdfs_resource::ResourceType;

    use super::*;

    fn config(json: &str) -> ReconcilerConfig {
        serde_json::from_str(json).unwrap()
    }

    fn resource(target: &str) -> HdfsResource {
        HdfsResource {
            target: target.to_string(),
            ty: ResourceType::Directory,
            action: ResourceAction::Create,
            source: None,
            owner: None,
            group: None,
            mode: None,
            recursive_chown: false,
            recursive_chmod: false,
            change_permissions_for_parents: false,
            manage_if_exists: true,
            replace_existing_files: false,
            dfs_type: String::new(),
        }
    }

    #[rstest]
    #[case::hcfs_always_jar(
        r#"{"defaultFs": "hdfs://c:8020", "dfsType": "hcfs", "webhdfsEnabled": true}"#,
        Strategy::JarBatch
    )]
    #[case::webhdfs_on_hdfs(
        r#"{"defaultFs": "hdfs://c:8020", "webhdfsEnabled": true}"#,
        Strategy::WebHdfs
    )]
    #[case::webhdfs_disabled(
        r#"{"defaultFs": "hdfs://c:8020", "webhdfsEnabled": false}"#,
        Strategy::JarBatch
    )]
    #[case::non_hdfs_scheme(
        r#"{"defaultFs": "s3a://bucket", "webhdfsEnabled": true}"#,
        Strategy::JarBatch
    )]
    fn strategy_selection(#[case] config_json: &str, #[case] expected: Strategy) {
        assert_eq!(select_strategy(&config(config_json)), expected);
    }

    #[test]
    fn targets_are_normalized_when_queued() {
        let mut reconciler = Reconciler::new(
            config(r#"{"defaultFs": "hdfs://c:8020"}"#),
            PathSet::default(),
        );
        reconciler.create_on_execute(resource("hdfs://c:8020/apps//x/"));

        assert_eq!(reconciler.pending(), 1);
        assert_eq!(reconciler.queue[0].target, "/apps/x");
        assert_eq!(reconciler.queue[0].dfs_type, "HDFS");
    }

    #[test]
    fn ignored_targets_never_enter_the_queue() {
        let mut reconciler = Reconciler::new(
            config(r#"{"defaultFs": "hdfs://c:8020"}"#),
            PathSet::from_paths(["/apps/falcon"]),
        );

        reconciler.create_on_execute(resource("hdfs://c:8020/apps/falcon"));
        reconciler.delete_on_execute(resource("/apps/falcon/"));
        reconciler.create_on_execute(resource("/apps/oozie"));

        assert_eq!(reconciler.pending(), 1);
        assert_eq!(reconciler.queue[0].target, "/apps/oozie");
    }

    #[test]
    fn delete_on_execute_overrides_the_action() {
        let mut reconciler = Reconciler::new(
            config(r#"{"defaultFs": "hdfs://c:8020"}"#),
            PathSet::default(),
        );
        reconciler.delete_on_execute(resource("/apps/x"));
        assert_eq!(reconciler.queue[0].action, ResourceAction::Delete);
    }

    #[tokio::test]
    async fn executing_an_empty_queue_is_a_noop() {
        let mut reconciler = Reconciler::new(
            config(r#"{"defaultFs": "hdfs://c:8020"}"#),
            PathSet::default(),
        );
        reconciler.execute().await.unwrap();
    }
}
