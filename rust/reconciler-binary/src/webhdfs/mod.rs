//! Per-resource convergence over the WebHDFS REST API.
//!
//! Resources are processed strictly in queue order, one blocking call
//! sequence per resource. Every mutation is guarded by a remote status
//! check, so re-applying an already-converged batch produces no writes.
//! There is no rollback: a failure leaves prior resources in their new
//! state and aborts the rest of the queue.

pub mod client;
pub mod message;

use std::path::{Path, PathBuf};

use snafu::{ensure, ResultExt, Snafu};
use stackable_hdfs_resource::{
    constants::{MAX_DIRECTORIES_FOR_RECURSIVE_REST, MAX_FILES_FOR_RECURSIVE_REST},
    ignore::PathSet,
    path, HdfsResource, ResourceAction, ResourceType,
};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::{
    config::ReconcilerConfig,
    hadoop::{self, CommandRunner, HadoopCommand, ProcessRunner},
};
use client::WebHdfsClient;
use message::{FileStatus, FileStatusType};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("source path {source_path:?} for {target} does not exist"))]
    SourceMissing {
        target: String,
        source_path: PathBuf,
    },

    #[snafu(display(
        "source path {source_path:?} is a {found}, but {target} is declared as a {declared}"
    ))]
    SourceTypeMismatch {
        target: String,
        source_path: PathBuf,
        declared: ResourceType,
        found: ResourceType,
    },

    #[snafu(display("{target} already exists as a {found}, but is declared as a {declared}"))]
    RemoteTypeMismatch {
        target: String,
        declared: ResourceType,
        found: FileStatusType,
    },

    #[snafu(display("invalid permission bits {mode:?} on {target}"))]
    InvalidMode {
        source: std::num::ParseIntError,
        target: String,
        mode: String,
    },

    #[snafu(display("failed to inspect source path {source_path:?}"))]
    InspectSource {
        source: std::io::Error,
        source_path: PathBuf,
    },

    #[snafu(display("failed to read source file {source_path:?}"))]
    ReadSource {
        source: std::io::Error,
        source_path: PathBuf,
    },

    #[snafu(display("failed to walk source directory {source_path:?}"))]
    WalkSource {
        source: walkdir::Error,
        source_path: PathBuf,
    },

    #[snafu(display("WebHDFS request failed"))]
    Client { source: client::Error },

    #[snafu(display("bulk filesystem client invocation failed"))]
    BulkApply { source: hadoop::Error },
}

pub struct WebHdfsExecutor<'a> {
    client: WebHdfsClient,
    config: &'a ReconcilerConfig,
    immutable: PathSet,
    runner: Box<dyn CommandRunner>,
}

impl<'a> WebHdfsExecutor<'a> {
    pub fn new(config: &'a ReconcilerConfig) -> Result<Self, client::Error> {
        Ok(Self {
            client: WebHdfsClient::new(config)?,
            config,
            immutable: PathSet::from_paths(&config.immutable_paths),
            runner: Box::new(ProcessRunner),
        })
    }

    #[cfg(test)]
    fn with_parts(
        config: &'a ReconcilerConfig,
        transport: Box<dyn client::Transport>,
        runner: Box<dyn CommandRunner>,
    ) -> Result<Self, client::Error> {
        Ok(Self {
            client: WebHdfsClient::with_transport(config, transport)?,
            config,
            immutable: PathSet::from_paths(&config.immutable_paths),
            runner,
        })
    }

    pub async fn run(&self, batch: &[HdfsResource]) -> Result<()> {
        for resource in batch {
            self.apply(resource).await?;
        }
        Ok(())
    }

    async fn apply(&self, resource: &HdfsResource) -> Result<()> {
        debug!(path = %resource.target, action = %resource.action, "reconciling resource");
        match resource.action {
            ResourceAction::Create => self.apply_create(resource).await,
            ResourceAction::Delete => self.apply_delete(resource).await,
            // Flush markers never make it into the queue.
            ResourceAction::Execute => Ok(()),
        }
    }

    async fn apply_create(&self, resource: &HdfsResource) -> Result<()> {
        let status = self.validate(resource).await?;

        if !resource.manage_if_exists && status.is_some() {
            info!(
                path = %resource.target,
                "target exists and is marked as externally managed, skipping"
            );
            return Ok(());
        }

        match resource.ty {
            ResourceType::Directory => {
                if status.is_none() {
                    self.client
                        .mkdirs(&resource.target)
                        .await
                        .context(ClientSnafu)?;
                }
                if let Some(source) = &resource.source {
                    self.upload_tree(
                        Path::new(source),
                        &resource.target,
                        resource.replace_existing_files,
                    )
                    .await?;
                }
            }
            ResourceType::File => self.create_file(resource, status.as_ref()).await?,
        }

        self.apply_ownership(resource, status.as_ref()).await
    }

    async fn apply_delete(&self, resource: &HdfsResource) -> Result<()> {
        let status = self
            .client
            .get_file_status(&resource.target)
            .await
            .context(ClientSnafu)?;

        match status {
            None => {
                info!(path = %resource.target, "target is already absent");
                Ok(())
            }
            Some(_) => self
                .client
                .delete(&resource.target)
                .await
                .context(ClientSnafu),
        }
    }

    /// Checks the local source (when given) and the remote object against the
    /// declared type and returns the current remote status.
    async fn validate(&self, resource: &HdfsResource) -> Result<Option<FileStatus>> {
        if let Some(source) = &resource.source {
            let source_path = Path::new(source);
            let metadata = match tokio::fs::metadata(source_path).await {
                Ok(metadata) => metadata,
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                    return SourceMissingSnafu {
                        target: &resource.target,
                        source_path,
                    }
                    .fail();
                }
                Err(error) => {
                    return Err(error).context(InspectSourceSnafu { source_path });
                }
            };

            let found = if metadata.is_dir() {
                ResourceType::Directory
            } else {
                ResourceType::File
            };
            ensure!(
                found == resource.ty,
                SourceTypeMismatchSnafu {
                    target: &resource.target,
                    source_path,
                    declared: resource.ty,
                    found,
                }
            );
        }

        let status = self
            .client
            .get_file_status(&resource.target)
            .await
            .context(ClientSnafu)?;

        if let Some(status) = &status {
            let matches = matches!(
                (resource.ty, status.ty),
                (ResourceType::File, FileStatusType::File)
                    | (ResourceType::Directory, FileStatusType::Directory)
            );
            ensure!(
                matches,
                RemoteTypeMismatchSnafu {
                    target: &resource.target,
                    declared: resource.ty,
                    found: status.ty,
                }
            );
        }

        Ok(status)
    }

    async fn create_file(
        &self,
        resource: &HdfsResource,
        status: Option<&FileStatus>,
    ) -> Result<()> {
        match &resource.source {
            None => {
                if status.is_none() {
                    self.client
                        .create(&resource.target, Vec::new(), false)
                        .await
                        .context(ClientSnafu)?;
                } else {
                    debug!(path = %resource.target, "file already exists, nothing to upload");
                }
                Ok(())
            }
            Some(source) => {
                self.upload_file(
                    &resource.target,
                    Path::new(source),
                    status,
                    resource.replace_existing_files,
                )
                .await
            }
        }
    }

    async fn upload_file(
        &self,
        target: &str,
        source: &Path,
        status: Option<&FileStatus>,
        replace_existing: bool,
    ) -> Result<()> {
        let metadata = tokio::fs::metadata(source)
            .await
            .context(InspectSourceSnafu { source_path: source })?;

        if let Some(status) = status {
            // Length equality is the only sync check; content that differs
            // at identical size is treated as already uploaded.
            if status.length == metadata.len() {
                info!(path = target, "remote length matches the local size, skipping upload");
                return Ok(());
            }
            if !replace_existing {
                info!(
                    path = target,
                    source = %source.display(),
                    "target differs from the source but replacing existing files is disabled, skipping upload"
                );
                return Ok(());
            }
        }

        let body = tokio::fs::read(source)
            .await
            .context(ReadSourceSnafu { source_path: source })?;
        self.client
            .create(target, body, status.is_some())
            .await
            .context(ClientSnafu)
    }

    /// Mirrors a local directory tree into the filesystem, depth first;
    /// directories are created before their contents.
    async fn upload_tree(
        &self,
        source_root: &Path,
        target_root: &str,
        replace_existing: bool,
    ) -> Result<()> {
        for entry in WalkDir::new(source_root).min_depth(1).sort_by_file_name() {
            let entry = entry.context(WalkSourceSnafu {
                source_path: source_root,
            })?;
            let Ok(relative) = entry.path().strip_prefix(source_root) else {
                continue;
            };
            let remote = path::normalize(&format!(
                "{}/{}",
                target_root,
                relative.to_string_lossy()
            ));

            if entry.file_type().is_dir() {
                self.client.mkdirs(&remote).await.context(ClientSnafu)?;
            } else {
                let status = self
                    .client
                    .get_file_status(&remote)
                    .await
                    .context(ClientSnafu)?;
                self.upload_file(&remote, entry.path(), status.as_ref(), replace_existing)
                    .await?;
            }
        }
        Ok(())
    }

    async fn apply_ownership(
        &self,
        resource: &HdfsResource,
        status: Option<&FileStatus>,
    ) -> Result<()> {
        let owner = resource.owner.as_deref();
        let group = resource.group.as_deref();
        let wants_chown = owner.is_some() || group.is_some();
        let wants_chmod = resource.mode.is_some();
        if !wants_chown && !wants_chmod {
            return Ok(());
        }

        if self.is_immutable(&resource.target) {
            return Ok(());
        }

        if wants_chown && owner_differs(owner, group, status) {
            self.client
                .set_owner(&resource.target, owner, group)
                .await
                .context(ClientSnafu)?;
        }
        if let Some(mode) = &resource.mode {
            if mode_differs(&resource.target, mode, status)? {
                self.client
                    .set_permission(&resource.target, mode)
                    .await
                    .context(ClientSnafu)?;
            }
        }

        if (resource.recursive_chown && wants_chown)
            || (resource.recursive_chmod && wants_chmod)
        {
            self.apply_ownership_recursive(resource).await?;
        }

        if resource.change_permissions_for_parents {
            for parent in path::ancestors(&resource.target) {
                if self.is_immutable(&parent) {
                    continue;
                }
                if wants_chown {
                    self.client
                        .set_owner(&parent, owner, group)
                        .await
                        .context(ClientSnafu)?;
                }
                if let Some(mode) = &resource.mode {
                    self.client
                        .set_permission(&parent, mode)
                        .await
                        .context(ClientSnafu)?;
                }
            }
        }

        Ok(())
    }

    async fn apply_ownership_recursive(&self, resource: &HdfsResource) -> Result<()> {
        let owner = resource.owner.as_deref();
        let group = resource.group.as_deref();

        let summary = self
            .client
            .content_summary(&resource.target)
            .await
            .context(ClientSnafu)?;

        if summary.file_count <= MAX_FILES_FOR_RECURSIVE_REST
            && summary.directory_count <= MAX_DIRECTORIES_FOR_RECURSIVE_REST
        {
            for child in self.list_recursive(&resource.target).await? {
                if self.is_immutable(&child) {
                    continue;
                }
                if resource.recursive_chown && wants_any(owner, group) {
                    self.client
                        .set_owner(&child, owner, group)
                        .await
                        .context(ClientSnafu)?;
                }
                if resource.recursive_chmod {
                    if let Some(mode) = &resource.mode {
                        self.client
                            .set_permission(&child, mode)
                            .await
                            .context(ClientSnafu)?;
                    }
                }
            }
            return Ok(());
        }

        info!(
            path = %resource.target,
            files = summary.file_count,
            directories = summary.directory_count,
            "tree is too large for per-entry calls, falling back to the filesystem client"
        );
        if resource.recursive_chown && wants_any(owner, group) {
            let owner_arg = hadoop::owner_spec(owner, group);
            let command =
                HadoopCommand::fs_chown_recursive(self.config, &owner_arg, &resource.target);
            let output = self.runner.run(&command).await.context(BulkApplySnafu)?;
            hadoop::ensure_success(&command, &output).context(BulkApplySnafu)?;
        }
        if resource.recursive_chmod {
            if let Some(mode) = &resource.mode {
                let command =
                    HadoopCommand::fs_chmod_recursive(self.config, mode, &resource.target);
                let output = self.runner.run(&command).await.context(BulkApplySnafu)?;
                hadoop::ensure_success(&command, &output).context(BulkApplySnafu)?;
            }
        }
        Ok(())
    }

    /// Enumerates the whole tree below `root` through `LISTSTATUS` calls.
    async fn list_recursive(&self, root: &str) -> Result<Vec<String>> {
        let mut discovered = Vec::new();
        let mut pending = vec![root.to_string()];
        while let Some(dir) = pending.pop() {
            for status in self.client.list_status(&dir).await.context(ClientSnafu)? {
                let child = format!("{}/{}", dir.trim_end_matches('/'), status.path_suffix);
                if status.ty == FileStatusType::Directory {
                    pending.push(child.clone());
                }
                discovered.push(child);
            }
        }
        Ok(discovered)
    }

    fn is_immutable(&self, target: &str) -> bool {
        if self.immutable.contains(target) {
            info!(
                path = target,
                "path is marked immutable, leaving ownership and permissions unchanged"
            );
            true
        } else {
            false
        }
    }
}

fn wants_any(owner: Option<&str>, group: Option<&str>) -> bool {
    owner.is_some() || group.is_some()
}

fn owner_differs(
    owner: Option<&str>,
    group: Option<&str>,
    status: Option<&FileStatus>,
) -> bool {
    match status {
        None => true,
        Some(status) => {
            owner.is_some_and(|owner| owner != status.owner)
                || group.is_some_and(|group| group != status.group)
        }
    }
}

fn mode_differs(target: &str, declared: &str, status: Option<&FileStatus>) -> Result<bool> {
    let Some(status) = status else {
        return Ok(true);
    };
    let declared_bits = u32::from_str_radix(declared, 8).context(InvalidModeSnafu {
        target,
        mode: declared,
    })?;
    let remote_bits = u32::from_str_radix(&status.permission, 8).context(InvalidModeSnafu {
        target,
        mode: &status.permission,
    })?;
    Ok(declared_bits != remote_bits)
}

#[cfg(test)]
mod test {
    use std::{
        collections::VecDeque,
        io::Write,
        sync::{Arc, Mutex},
    };

    use async_trait::async_trait;

    use super::{
        client::{Transport, TransportError, WebHdfsRequest, WebHdfsResponse},
        *,
    };
    use crate::hadoop::CommandOutput;

    #[derive(Debug, Default)]
    struct Recorded {
        calls: Vec<(String, String)>,
        commands: Vec<HadoopCommand>,
    }

    struct ScriptedTransport {
        responses: Mutex<VecDeque<(u16, String)>>,
        recorded: Arc<Mutex<Recorded>>,
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn execute(
            &self,
            request: &WebHdfsRequest,
        ) -> std::result::Result<WebHdfsResponse, TransportError> {
            self.recorded
                .lock()
                .unwrap()
                .calls
                .push((request.op.to_string(), request.path.clone()));
            let (status, body) = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("unscripted request: {} {}", request.op, request.path));
            Ok(WebHdfsResponse {
                status,
                body: body.into_bytes(),
            })
        }
    }

    struct ScriptedRunner {
        recorded: Arc<Mutex<Recorded>>,
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, command: &HadoopCommand) -> hadoop::Result<CommandOutput> {
            self.recorded.lock().unwrap().commands.push(command.clone());
            Ok(CommandOutput {
                code: 0,
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }

    struct Harness {
        config: ReconcilerConfig,
        recorded: Arc<Mutex<Recorded>>,
        responses: VecDeque<(u16, String)>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_config(
                r#"{"defaultFs": "hdfs://mycluster:8020", "user": "hdfs", "namenodeHttpEndpoints": ["nn1:9870"]}"#,
            )
        }

        fn with_config(json: &str) -> Self {
            Self {
                config: serde_json::from_str(json).unwrap(),
                recorded: Arc::new(Mutex::new(Recorded::default())),
                responses: VecDeque::new(),
            }
        }

        fn respond(&mut self, status: u16, body: &str) -> &mut Self {
            self.responses.push_back((status, body.to_string()));
            self
        }

        async fn run(self, batch: &[HdfsResource]) -> Result<Arc<Mutex<Recorded>>> {
            let recorded = Arc::clone(&self.recorded);
            let transport = Box::new(ScriptedTransport {
                responses: Mutex::new(self.responses),
                recorded: Arc::clone(&recorded),
            });
            let runner = Box::new(ScriptedRunner {
                recorded: Arc::clone(&recorded),
            });
            let executor = WebHdfsExecutor::with_parts(&self.config, transport, runner)
                .expect("executor must build");
            executor.run(batch).await?;
            Ok(recorded)
        }
    }

    fn ops(recorded: &Arc<Mutex<Recorded>>) -> Vec<(String, String)> {
        recorded.lock().unwrap().calls.clone()
    }

    fn resource(target: &str, ty: ResourceType, action: ResourceAction) -> HdfsResource {
        HdfsResource {
            target: target.to_string(),
            ty,
            action,
            source: None,
            owner: None,
            group: None,
            mode: None,
            recursive_chown: false,
            recursive_chmod: false,
            change_permissions_for_parents: false,
            manage_if_exists: true,
            replace_existing_files: false,
            dfs_type: "HDFS".to_string(),
        }
    }

    fn dir_status(owner: &str, permission: &str) -> String {
        format!(
            r#"{{"FileStatus": {{"type": "DIRECTORY", "owner": "{owner}", "group": "hadoop", "permission": "{permission}", "length": 0}}}}"#
        )
    }

    fn file_status(length: u64) -> String {
        format!(
            r#"{{"FileStatus": {{"type": "FILE", "owner": "hdfs", "group": "hadoop", "permission": "644", "length": {length}}}}}"#
        )
    }

    #[tokio::test]
    async fn directory_and_file_creation_sequence() {
        let source = tempfile::NamedTempFile::new().unwrap();

        let mut directory = resource("/apps/x", ResourceType::Directory, ResourceAction::Create);
        directory.owner = Some("hdfs".to_string());
        directory.mode = Some("0755".to_string());
        let mut file = resource("/apps/x/f", ResourceType::File, ResourceAction::Create);
        file.source = Some(source.path().display().to_string());

        let mut harness = Harness::new();
        harness
            .respond(404, "{}")
            .respond(200, r#"{"boolean": true}"#)
            .respond(200, "")
            .respond(200, "")
            .respond(404, "{}")
            .respond(201, "");

        let recorded = harness.run(&[directory, file]).await.unwrap();
        assert_eq!(
            ops(&recorded),
            vec![
                ("GETFILESTATUS".to_string(), "/apps/x".to_string()),
                ("MKDIRS".to_string(), "/apps/x".to_string()),
                ("SETOWNER".to_string(), "/apps/x".to_string()),
                ("SETPERMISSION".to_string(), "/apps/x".to_string()),
                ("GETFILESTATUS".to_string(), "/apps/x/f".to_string()),
                ("CREATE".to_string(), "/apps/x/f".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn unmanaged_existing_target_is_left_alone() {
        let mut directory = resource("/apps/ext", ResourceType::Directory, ResourceAction::Create);
        directory.manage_if_exists = false;
        directory.owner = Some("hdfs".to_string());
        directory.mode = Some("0700".to_string());

        let mut harness = Harness::new();
        harness.respond(200, &dir_status("someone", "777"));

        let recorded = harness.run(&[directory]).await.unwrap();
        assert_eq!(
            ops(&recorded),
            vec![("GETFILESTATUS".to_string(), "/apps/ext".to_string())]
        );
    }

    #[tokio::test]
    async fn matching_length_skips_the_upload() {
        let mut source = tempfile::NamedTempFile::new().unwrap();
        source.write_all(b"hello").unwrap();

        let mut file = resource("/apps/f", ResourceType::File, ResourceAction::Create);
        file.source = Some(source.path().display().to_string());

        let mut harness = Harness::new();
        harness.respond(200, &file_status(5));

        let recorded = harness.run(&[file]).await.unwrap();
        assert_eq!(
            ops(&recorded),
            vec![("GETFILESTATUS".to_string(), "/apps/f".to_string())]
        );
    }

    #[tokio::test]
    async fn differing_file_is_kept_unless_replacement_is_enabled() {
        let mut source = tempfile::NamedTempFile::new().unwrap();
        source.write_all(b"new content").unwrap();

        let mut file = resource("/apps/f", ResourceType::File, ResourceAction::Create);
        file.source = Some(source.path().display().to_string());

        let mut harness = Harness::new();
        harness.respond(200, &file_status(5));
        let recorded = harness.run(&[file.clone()]).await.unwrap();
        assert_eq!(ops(&recorded).len(), 1);

        file.replace_existing_files = true;
        let mut harness = Harness::new();
        harness.respond(200, &file_status(5)).respond(201, "");
        let recorded = harness.run(&[file]).await.unwrap();
        assert_eq!(
            ops(&recorded),
            vec![
                ("GETFILESTATUS".to_string(), "/apps/f".to_string()),
                ("CREATE".to_string(), "/apps/f".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn recursive_chmod_below_the_threshold_uses_rest_calls() {
        let mut directory = resource("/data", ResourceType::Directory, ResourceAction::Create);
        directory.mode = Some("0755".to_string());
        directory.recursive_chmod = true;

        let mut harness = Harness::new();
        harness
            .respond(200, &dir_status("hdfs", "777"))
            .respond(200, "")
            .respond(
                200,
                r#"{"ContentSummary": {"directoryCount": 2, "fileCount": 999}}"#,
            )
            .respond(
                200,
                r#"{"FileStatuses": {"FileStatus": [
                    {"pathSuffix": "a", "type": "FILE", "owner": "hdfs", "group": "hadoop", "permission": "644", "length": 1},
                    {"pathSuffix": "sub", "type": "DIRECTORY", "owner": "hdfs", "group": "hadoop", "permission": "755"}
                ]}}"#,
            )
            .respond(200, r#"{"FileStatuses": {"FileStatus": []}}"#)
            .respond(200, "")
            .respond(200, "");

        let recorded = harness.run(&[directory]).await.unwrap();
        assert_eq!(
            ops(&recorded),
            vec![
                ("GETFILESTATUS".to_string(), "/data".to_string()),
                ("SETPERMISSION".to_string(), "/data".to_string()),
                ("GETCONTENTSUMMARY".to_string(), "/data".to_string()),
                ("LISTSTATUS".to_string(), "/data".to_string()),
                ("LISTSTATUS".to_string(), "/data/sub".to_string()),
                ("SETPERMISSION".to_string(), "/data/a".to_string()),
                ("SETPERMISSION".to_string(), "/data/sub".to_string()),
            ]
        );
        assert!(recorded.lock().unwrap().commands.is_empty());
    }

    #[tokio::test]
    async fn recursive_chown_above_the_threshold_uses_the_shell_fallback() {
        let mut directory = resource("/data", ResourceType::Directory, ResourceAction::Create);
        directory.owner = Some("hive".to_string());
        directory.group = Some("hadoop".to_string());
        directory.recursive_chown = true;

        let mut harness = Harness::new();
        harness
            .respond(200, &dir_status("hdfs", "755"))
            .respond(200, "")
            .respond(
                200,
                r#"{"ContentSummary": {"directoryCount": 3, "fileCount": 1001}}"#,
            );

        let recorded = harness.run(&[directory]).await.unwrap();
        assert_eq!(
            ops(&recorded),
            vec![
                ("GETFILESTATUS".to_string(), "/data".to_string()),
                ("SETOWNER".to_string(), "/data".to_string()),
                ("GETCONTENTSUMMARY".to_string(), "/data".to_string()),
            ]
        );

        let commands = recorded.lock().unwrap().commands.clone();
        assert_eq!(commands.len(), 1);
        assert_eq!(
            commands[0].args,
            vec!["fs", "-chown", "-R", "hive:hadoop", "/data"]
        );
    }

    #[tokio::test]
    async fn parent_permissions_are_applied_from_the_root_down() {
        let mut directory = resource("/a/b/c", ResourceType::Directory, ResourceAction::Create);
        directory.mode = Some("0755".to_string());
        directory.change_permissions_for_parents = true;

        let mut harness = Harness::new();
        harness
            .respond(404, "{}")
            .respond(200, r#"{"boolean": true}"#)
            .respond(200, "")
            .respond(200, "")
            .respond(200, "");

        let recorded = harness.run(&[directory]).await.unwrap();
        assert_eq!(
            ops(&recorded),
            vec![
                ("GETFILESTATUS".to_string(), "/a/b/c".to_string()),
                ("MKDIRS".to_string(), "/a/b/c".to_string()),
                ("SETPERMISSION".to_string(), "/a/b/c".to_string()),
                ("SETPERMISSION".to_string(), "/a".to_string()),
                ("SETPERMISSION".to_string(), "/a/b".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn delete_is_a_noop_for_absent_targets() {
        let mut harness = Harness::new();
        harness.respond(404, "{}");
        let recorded = harness
            .run(&[resource("/gone", ResourceType::Directory, ResourceAction::Delete)])
            .await
            .unwrap();
        assert_eq!(
            ops(&recorded),
            vec![("GETFILESTATUS".to_string(), "/gone".to_string())]
        );

        let mut harness = Harness::new();
        harness
            .respond(200, &dir_status("hdfs", "755"))
            .respond(200, r#"{"boolean": true}"#);
        let recorded = harness
            .run(&[resource("/old", ResourceType::Directory, ResourceAction::Delete)])
            .await
            .unwrap();
        assert_eq!(
            ops(&recorded),
            vec![
                ("GETFILESTATUS".to_string(), "/old".to_string()),
                ("DELETE".to_string(), "/old".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn conflicting_remote_type_fails() {
        let mut harness = Harness::new();
        harness.respond(200, &dir_status("hdfs", "755"));

        let error = harness
            .run(&[resource("/apps/f", ResourceType::File, ResourceAction::Create)])
            .await
            .unwrap_err();
        assert!(matches!(error, Error::RemoteTypeMismatch { .. }));
    }

    #[tokio::test]
    async fn missing_source_fails_before_any_network_traffic() {
        let mut file = resource("/apps/f", ResourceType::File, ResourceAction::Create);
        file.source = Some("/nonexistent/source".to_string());

        let harness = Harness::new();
        let error = harness.run(&[file]).await.unwrap_err();
        assert!(matches!(error, Error::SourceMissing { .. }));
    }

    #[tokio::test]
    async fn directory_source_mirrors_the_local_tree() {
        let source = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("file2.txt"), b"two").unwrap();
        std::fs::create_dir(source.path().join("sub")).unwrap();
        std::fs::write(source.path().join("sub/file1.txt"), b"one").unwrap();

        let mut directory = resource("/apps/d", ResourceType::Directory, ResourceAction::Create);
        directory.source = Some(source.path().display().to_string());

        let mut harness = Harness::new();
        harness
            .respond(404, "{}")
            .respond(200, r#"{"boolean": true}"#)
            .respond(404, "{}")
            .respond(201, "")
            .respond(200, r#"{"boolean": true}"#)
            .respond(404, "{}")
            .respond(201, "");

        let recorded = harness.run(&[directory]).await.unwrap();
        assert_eq!(
            ops(&recorded),
            vec![
                ("GETFILESTATUS".to_string(), "/apps/d".to_string()),
                ("MKDIRS".to_string(), "/apps/d".to_string()),
                ("GETFILESTATUS".to_string(), "/apps/d/file2.txt".to_string()),
                ("CREATE".to_string(), "/apps/d/file2.txt".to_string()),
                ("MKDIRS".to_string(), "/apps/d/sub".to_string()),
                ("GETFILESTATUS".to_string(), "/apps/d/sub/file1.txt".to_string()),
                ("CREATE".to_string(), "/apps/d/sub/file1.txt".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn immutable_paths_keep_their_permissions() {
        let mut directory =
            resource("/apps/hbase", ResourceType::Directory, ResourceAction::Create);
        directory.owner = Some("hbase".to_string());
        directory.mode = Some("0700".to_string());

        let mut harness = Harness::with_config(
            r#"{"defaultFs": "hdfs://mycluster:8020", "user": "hdfs", "namenodeHttpEndpoints": ["nn1:9870"], "immutablePaths": ["/apps/hbase"]}"#,
        );
        harness.respond(200, &dir_status("someone", "777"));

        let recorded = harness.run(&[directory]).await.unwrap();
        assert_eq!(
            ops(&recorded),
            vec![("GETFILESTATUS".to_string(), "/apps/hbase".to_string())]
        );
    }
}
