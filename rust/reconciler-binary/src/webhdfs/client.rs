//! Low-level WebHDFS REST client.
//!
//! URLs take the form
//! `{endpoint}/webhdfs/v1{path}?op={OPERATION}&user.name={user}&...`.
//! Responses are validated against a per-operation allow-list of HTTP status
//! codes, and boolean-result operations additionally require
//! `{"boolean": true}` in the body; anything else aborts the batch with the
//! full operation, URL, status and body attached.
//!
//! Requests go through the [`Transport`] trait. Production uses a `reqwest`
//! client (certificate verification is dropped when HTTPS is enabled, like
//! the original shell client's `-k`); tests substitute a recording fake.
//! Several namenode endpoints may be configured; a connection-level failure
//! fails over to the next one, an HTTP-level error does not.

use async_trait::async_trait;
use reqwest::Method;
use snafu::{ensure, ResultExt, Snafu};
use stackable_hdfs_resource::constants::*;
use tracing::{debug, warn};
use url::Url;

use super::message::{
    BooleanResponse, ContentSummary, ContentSummaryWrapper, FileStatus, FileStatusWrapper,
    FileStatusesWrapper,
};
use crate::config::ReconcilerConfig;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(display("{message}"))]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to build the HTTP client"))]
    BuildClient { source: reqwest::Error },

    #[snafu(display("invalid namenode endpoint {endpoint:?}"))]
    InvalidEndpoint {
        source: url::ParseError,
        endpoint: String,
    },

    #[snafu(display("no namenode HTTP endpoint is configured"))]
    NoEndpoints,

    #[snafu(display("{op} {path} failed on every configured namenode"))]
    AllEndpointsFailed {
        source: TransportError,
        op: String,
        path: String,
    },

    #[snafu(display("{op} {path} returned status {status}: {body}"))]
    UnexpectedStatus {
        op: String,
        path: String,
        status: u16,
        body: String,
    },

    #[snafu(display("{op} {path} reported failure: {body}"))]
    OperationFailed {
        op: String,
        path: String,
        body: String,
    },

    #[snafu(display("failed to parse the {op} response for {path}: {body}"))]
    ParseResponse {
        source: serde_json::Error,
        op: String,
        path: String,
        body: String,
    },
}

pub struct WebHdfsRequest {
    pub method: Method,
    pub op: &'static str,
    pub path: String,
    pub url: Url,
    pub body: Option<Vec<u8>>,
}

pub struct WebHdfsResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl WebHdfsResponse {
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &WebHdfsRequest) -> Result<WebHdfsResponse, TransportError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(accept_invalid_certs: bool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .context(BuildClientSnafu)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &WebHdfsRequest) -> Result<WebHdfsResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|error| TransportError::new(error.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|error| TransportError::new(error.to_string()))?
            .to_vec();

        Ok(WebHdfsResponse { status, body })
    }
}

pub struct WebHdfsClient {
    endpoints: Vec<Url>,
    user: String,
    transport: Box<dyn Transport>,
}

impl std::fmt::Debug for WebHdfsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebHdfsClient")
            .field("endpoints", &self.endpoints)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl WebHdfsClient {
    pub fn new(config: &ReconcilerConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.https_enabled)?;
        Self::with_transport(config, Box::new(transport))
    }

    pub fn with_transport(config: &ReconcilerConfig, transport: Box<dyn Transport>) -> Result<Self> {
        let scheme = if config.https_enabled { "https" } else { "http" };
        let mut endpoints = Vec::with_capacity(config.namenode_http_endpoints.len());
        for endpoint in &config.namenode_http_endpoints {
            let raw = if endpoint.contains("://") {
                endpoint.clone()
            } else {
                format!("{scheme}://{endpoint}")
            };
            endpoints.push(Url::parse(&raw).context(InvalidEndpointSnafu { endpoint })?);
        }
        ensure!(!endpoints.is_empty(), NoEndpointsSnafu);

        Ok(Self {
            endpoints,
            user: config.user.clone(),
            transport,
        })
    }

    pub async fn get_file_status(&self, path: &str) -> Result<Option<FileStatus>> {
        let response = self
            .run_op(
                Method::GET,
                OP_GET_FILE_STATUS,
                path,
                &[],
                None,
                // 404 means "not there yet", which is a legal answer here.
                &[200, 404],
            )
            .await?;
        if response.status == 404 {
            return Ok(None);
        }

        let wrapper: FileStatusWrapper = parse(OP_GET_FILE_STATUS, path, &response)?;
        Ok(Some(wrapper.file_status))
    }

    pub async fn list_status(&self, path: &str) -> Result<Vec<FileStatus>> {
        let response = self
            .run_op(Method::GET, OP_LIST_STATUS, path, &[], None, &[200])
            .await?;
        let wrapper: FileStatusesWrapper = parse(OP_LIST_STATUS, path, &response)?;
        Ok(wrapper.file_statuses.file_status)
    }

    pub async fn content_summary(&self, path: &str) -> Result<ContentSummary> {
        let response = self
            .run_op(Method::GET, OP_GET_CONTENT_SUMMARY, path, &[], None, &[200])
            .await?;
        let wrapper: ContentSummaryWrapper = parse(OP_GET_CONTENT_SUMMARY, path, &response)?;
        Ok(wrapper.content_summary)
    }

    pub async fn mkdirs(&self, path: &str) -> Result<()> {
        let response = self
            .run_op(Method::PUT, OP_MKDIRS, path, &[], None, &[200])
            .await?;
        ensure_boolean(OP_MKDIRS, path, &response)
    }

    pub async fn create(&self, path: &str, body: Vec<u8>, overwrite: bool) -> Result<()> {
        let overwrite = if overwrite { "true" } else { "false" };
        self.run_op(
            Method::PUT,
            OP_CREATE,
            path,
            &[("overwrite", overwrite)],
            Some(body),
            &[200, 201],
        )
        .await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let response = self
            .run_op(
                Method::DELETE,
                OP_DELETE,
                path,
                &[("recursive", "true")],
                None,
                &[200],
            )
            .await?;
        ensure_boolean(OP_DELETE, path, &response)
    }

    pub async fn set_owner(
        &self,
        path: &str,
        owner: Option<&str>,
        group: Option<&str>,
    ) -> Result<()> {
        let mut params = Vec::new();
        if let Some(owner) = owner {
            params.push(("owner", owner));
        }
        if let Some(group) = group {
            params.push(("group", group));
        }
        self.run_op(Method::PUT, OP_SET_OWNER, path, &params, None, &[200])
            .await?;
        Ok(())
    }

    pub async fn set_permission(&self, path: &str, permission: &str) -> Result<()> {
        self.run_op(
            Method::PUT,
            OP_SET_PERMISSION,
            path,
            &[("permission", permission)],
            None,
            &[200],
        )
        .await?;
        Ok(())
    }

    async fn run_op(
        &self,
        method: Method,
        op: &'static str,
        path: &str,
        params: &[(&str, &str)],
        body: Option<Vec<u8>>,
        allowed: &[u16],
    ) -> Result<WebHdfsResponse> {
        let mut last_error = None;
        for endpoint in &self.endpoints {
            let request = WebHdfsRequest {
                method: method.clone(),
                op,
                path: path.to_string(),
                url: self.build_url(endpoint, path, op, params),
                body: body.clone(),
            };
            debug!(op, path, url = %request.url, "sending WebHDFS request");

            match self.transport.execute(&request).await {
                Ok(response) => {
                    ensure!(
                        allowed.contains(&response.status),
                        UnexpectedStatusSnafu {
                            op,
                            path,
                            status: response.status,
                            body: response.body_string(),
                        }
                    );
                    return Ok(response);
                }
                Err(error) => {
                    warn!(op, path, endpoint = %endpoint, %error, "namenode unreachable, trying next endpoint");
                    last_error = Some(error);
                }
            }
        }

        let source =
            last_error.unwrap_or_else(|| TransportError::new("no endpoint configured"));
        Err(Error::AllEndpointsFailed {
            source,
            op: op.to_string(),
            path: path.to_string(),
        })
    }

    fn build_url(&self, endpoint: &Url, path: &str, op: &str, params: &[(&str, &str)]) -> Url {
        let mut url = endpoint.clone();
        url.set_path(&format!("{WEBHDFS_API_PREFIX}{path}"));
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("op", op);
            query.append_pair("user.name", &self.user);
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        url
    }
}

fn parse<T: serde::de::DeserializeOwned>(
    op: &str,
    path: &str,
    response: &WebHdfsResponse,
) -> Result<T> {
    serde_json::from_slice(&response.body).context(ParseResponseSnafu {
        op,
        path,
        body: response.body_string(),
    })
}

fn ensure_boolean(op: &str, path: &str, response: &WebHdfsResponse) -> Result<()> {
    let parsed: BooleanResponse = parse(op, path, response)?;
    ensure!(
        parsed.boolean,
        OperationFailedSnafu {
            op,
            path,
            body: response.body_string(),
        }
    );
    Ok(())
}
