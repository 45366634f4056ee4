use snafu::{OptionExt, ResultExt, Snafu};
use tokio::process::Command;
use tracing::debug;

use crate::config::ReconcilerConfig;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Kerberos security is enabled but no keytab is configured"))]
    MissingKeytab,

    #[snafu(display("Kerberos security is enabled but no principal is configured"))]
    MissingPrincipal,

    #[snafu(display("failed to spawn kinit"))]
    SpawnKinit { source: std::io::Error },

    #[snafu(display("kinit for {principal} exited with {code}: {stderr}"))]
    KinitFailed {
        principal: String,
        code: i32,
        stderr: String,
    },
}

/// Obtains a ticket from the configured keytab.
///
/// Called once per batch, before any filesystem mutation; the individual
/// WebHDFS calls and the helper jar then reuse the ticket cache. A no-op
/// when security is disabled.
pub async fn kinit(config: &ReconcilerConfig) -> Result<()> {
    if !config.security_enabled {
        return Ok(());
    }

    let keytab = config.keytab.as_ref().context(MissingKeytabSnafu)?;
    let principal = config.principal.as_deref().context(MissingPrincipalSnafu)?;

    debug!(principal, "obtaining Kerberos ticket");
    let output = Command::new("kinit")
        .arg("-kt")
        .arg(keytab)
        .arg(principal)
        .output()
        .await
        .context(SpawnKinitSnafu)?;

    if !output.status.success() {
        return KinitFailedSnafu {
            principal,
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
        .fail();
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse_config(json: &str) -> ReconcilerConfig {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn disabled_security_is_a_noop() {
        let config = parse_config(r#"{"defaultFs": "hdfs://mycluster:8020"}"#);
        kinit(&config).await.unwrap();
    }

    #[tokio::test]
    async fn enabled_security_requires_keytab_and_principal() {
        let config = parse_config(
            r#"{"defaultFs": "hdfs://mycluster:8020", "securityEnabled": true}"#,
        );
        assert!(matches!(
            kinit(&config).await.unwrap_err(),
            Error::MissingKeytab
        ));

        let config = parse_config(
            r#"{"defaultFs": "hdfs://mycluster:8020", "securityEnabled": true, "keytab": "/etc/security/keytabs/hdfs.headless.keytab"}"#,
        );
        assert!(matches!(
            kinit(&config).await.unwrap_err(),
            Error::MissingPrincipal
        ));
    }
}
