// HTTP commit transport

use std::time::Duration;

use contactgrid_import::commit::{CommitResponse, CommitSink};
use contactgrid_import::model::ContactPayload;
use contactgrid_import::ImportError;
use tracing::{debug, warn};

use crate::exit_codes::EXIT_ERROR;
use crate::CliError;

const USER_AGENT: &str = concat!("cgrid/", env!("CARGO_PKG_VERSION"));

/// Longest server error body echoed back in a failure message.
const MAX_BODY_ECHO: usize = 200;

/// POSTs the batch as a JSON array and decodes the server's counts.
///
/// One attempt per commit. A bulk insert that timed out may still have
/// landed, so a retry here could double-insert.
pub struct HttpSink {
    http: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpSink {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, CliError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CliError {
                code: EXIT_ERROR,
                message: format!("failed to build HTTP client: {}", e),
                hint: None,
            })?;
        Ok(Self { http, endpoint: endpoint.to_string() })
    }
}

impl CommitSink for HttpSink {
    fn commit(&mut self, records: &[ContactPayload]) -> Result<CommitResponse, ImportError> {
        debug!(endpoint = %self.endpoint, records = records.len(), "posting batch");

        let resp = self
            .http
            .post(&self.endpoint)
            .json(records)
            .send()
            .map_err(|e| ImportError::Commit(format!("request to {} failed: {}", self.endpoint, e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            let body: String = body.trim().chars().take(MAX_BODY_ECHO).collect();
            warn!(status = status.as_u16(), "commit rejected");
            return Err(ImportError::Commit(if body.is_empty() {
                format!("server returned {}", status.as_u16())
            } else {
                format!("server returned {}: {}", status.as_u16(), body)
            }));
        }

        resp.json::<CommitResponse>()
            .map_err(|e| ImportError::Commit(format!("malformed server response: {}", e)))
    }
}
