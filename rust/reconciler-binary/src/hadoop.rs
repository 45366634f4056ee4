//! Invocations of the external Hadoop CLI.
//!
//! Two call sites exist: the jar batch (`hadoop jar`) and the bulk
//! `hadoop fs -chown/-chmod -R` fallback the WebHDFS executor uses when a
//! tree is too large for per-entry REST calls. Command construction is pure
//! so tests can assert the exact argv without spawning anything.

use std::{fmt, path::Path};

use async_trait::async_trait;
use snafu::{ResultExt, Snafu};
use tokio::process::Command;

use crate::config::ReconcilerConfig;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to spawn `{command}`"))]
    Spawn {
        source: std::io::Error,
        command: String,
    },

    #[snafu(display("`{command}` exited with {code}: {stderr}"))]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HadoopCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl HadoopCommand {
    fn base(config: &ReconcilerConfig) -> Self {
        let mut args = Vec::new();
        if let Some(conf_dir) = &config.hadoop_conf_dir {
            args.push("--config".to_string());
            args.push(conf_dir.display().to_string());
        }
        Self {
            program: config.hadoop_bin.display().to_string(),
            args,
        }
    }

    pub fn jar(config: &ReconcilerConfig, jar: &Path, batch_file: &Path) -> Self {
        let mut command = Self::base(config);
        command.args.push("jar".to_string());
        command.args.push(jar.display().to_string());
        command.args.push(batch_file.display().to_string());
        command
    }

    pub fn fs_chown_recursive(config: &ReconcilerConfig, owner: &str, target: &str) -> Self {
        let mut command = Self::base(config);
        command.args.extend(
            ["fs", "-chown", "-R", owner, target]
                .into_iter()
                .map(String::from),
        );
        command
    }

    pub fn fs_chmod_recursive(config: &ReconcilerConfig, mode: &str, target: &str) -> Self {
        let mut command = Self::base(config);
        command.args.extend(
            ["fs", "-chmod", "-R", mode, target]
                .into_iter()
                .map(String::from),
        );
        command
    }
}

impl fmt::Display for HadoopCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.program, self.args.join(" "))
    }
}

/// The `owner[:group]` argument accepted by `hadoop fs -chown`.
pub fn owner_spec(owner: Option<&str>, group: Option<&str>) -> String {
    match (owner, group) {
        (Some(owner), Some(group)) => format!("{owner}:{group}"),
        (Some(owner), None) => owner.to_string(),
        (None, Some(group)) => format!(":{group}"),
        (None, None) => String::new(),
    }
}

#[derive(Debug)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &HadoopCommand) -> Result<CommandOutput>;
}

/// Runs commands as real child processes, blocking until they exit.
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &HadoopCommand) -> Result<CommandOutput> {
        let output = Command::new(&command.program)
            .args(&command.args)
            .output()
            .await
            .with_context(|_| SpawnSnafu {
                command: command.to_string(),
            })?;

        Ok(CommandOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

pub fn ensure_success(command: &HadoopCommand, output: &CommandOutput) -> Result<()> {
    if output.code != 0 {
        return CommandFailedSnafu {
            command: command.to_string(),
            code: output.code,
            stderr: output.stderr.clone(),
        }
        .fail();
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use rstest::rstest;

    use super::*;

    fn config(conf_dir: Option<&str>) -> ReconcilerConfig {
        let mut config: ReconcilerConfig =
            serde_json::from_str(r#"{"defaultFs": "hdfs://mycluster:8020"}"#).unwrap();
        config.hadoop_conf_dir = conf_dir.map(PathBuf::from);
        config
    }

    #[test]
    fn jar_command_argv() {
        let command = HadoopCommand::jar(
            &config(Some("/etc/hadoop/conf")),
            Path::new("/usr/lib/fast-hdfs-resource.jar"),
            Path::new("/tmp/hdfs_resources_1.json"),
        );

        assert_eq!(command.program, "hadoop");
        assert_eq!(
            command.args,
            vec![
                "--config",
                "/etc/hadoop/conf",
                "jar",
                "/usr/lib/fast-hdfs-resource.jar",
                "/tmp/hdfs_resources_1.json",
            ]
        );
    }

    #[test]
    fn chown_and_chmod_argv() {
        let config = config(None);

        let chown = HadoopCommand::fs_chown_recursive(&config, "hive:hadoop", "/apps/hive");
        assert_eq!(chown.args, vec!["fs", "-chown", "-R", "hive:hadoop", "/apps/hive"]);

        let chmod = HadoopCommand::fs_chmod_recursive(&config, "0777", "/apps/hive");
        assert_eq!(chmod.args, vec!["fs", "-chmod", "-R", "0777", "/apps/hive"]);
    }

    #[rstest]
    #[case(Some("hive"), Some("hadoop"), "hive:hadoop")]
    #[case(Some("hive"), None, "hive")]
    #[case(None, Some("hadoop"), ":hadoop")]
    #[case(None, None, "")]
    fn owner_spec_formatting(
        #[case] owner: Option<&str>,
        #[case] group: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(owner_spec(owner, group), expected);
    }

    #[test]
    fn non_zero_exit_is_an_error() {
        let command = HadoopCommand::fs_chmod_recursive(&config(None), "0755", "/apps");
        let output = CommandOutput {
            code: 1,
            stdout: String::new(),
            stderr: "chmod: Permission denied".to_string(),
        };

        let error = ensure_success(&command, &output).unwrap_err();
        assert!(error.to_string().contains("Permission denied"));
    }
}
