//! `curl` subprocess transport
//!
//! curl writes the response body and the `-w` write-out to the same stdout
//! stream. The status code is appended after [`SENTINEL`] and recovered by
//! splitting on the last occurrence, so bodies that happen to contain the
//! sentinel text are left intact.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{join_url, ApiRequest, Body, Exchange, Transport};
use crate::error::TransportError;

/// Delimiter between the body and the appended status code
pub const SENTINEL: &str = "|SEP|";

/// Recover `(status, body)` from curl's combined output.
///
/// - empty output is `(0, Empty)`
/// - output without the sentinel is `(0, Raw(output))`
/// - an unparseable status segment becomes 0
/// - a body segment that is not JSON is kept as `Raw`
pub fn split_combined_output(output: &str) -> Exchange {
    if output.is_empty() {
        return Exchange::new(0, Body::Empty);
    }

    let Some((body, status)) = output.rsplit_once(SENTINEL) else {
        return Exchange::new(0, Body::Raw(output.to_string()));
    };

    let status = status.trim().parse::<u16>().unwrap_or(0);
    Exchange::new(status, Body::parse(body))
}

/// Transport that shells out to the command-line HTTP client
#[derive(Debug, Clone)]
pub struct CurlTransport {
    base_url: String,
    binary: PathBuf,
}

struct CurlOutput {
    stdout: String,
    stderr: String,
    exit_code: Option<i32>,
}

impl CurlTransport {
    pub fn new(base_url: impl Into<String>, binary: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into(),
            binary: binary.into(),
        }
    }

    /// Arguments for one invocation; the payload itself goes over stdin
    pub fn build_args(&self, request: &ApiRequest, bearer: Option<&str>) -> Vec<String> {
        let mut args = vec![
            "-sS".to_string(),
            "-w".to_string(),
            format!("{SENTINEL}%{{http_code}}"),
            "-X".to_string(),
            request.method.as_str().to_string(),
            join_url(&self.base_url, &request.path),
            "-H".to_string(),
            "Content-Type: application/json".to_string(),
        ];

        if request.authenticated {
            if let Some(token) = bearer {
                args.push("-H".to_string());
                args.push(format!("Authorization: Bearer {token}"));
            }
        }

        if request.payload.is_some() {
            args.push("-d".to_string());
            args.push("@-".to_string());
        }

        args
    }

    async fn run(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<CurlOutput, TransportError> {
        let args = self.build_args(request, bearer);
        let payload = request.payload.as_ref().map(|p| p.to_string());

        let mut cmd = Command::new(&self.binary);
        cmd.args(&args)
            .stdin(if payload.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| TransportError::Spawn {
            program: self.binary.display().to_string(),
            source,
        })?;

        if let Some(payload) = payload {
            if let Some(mut stdin) = child.stdin.take() {
                stdin
                    .write_all(payload.as_bytes())
                    .await
                    .map_err(TransportError::Stdin)?;
            }
        }

        let output = child.wait_with_output().await.map_err(TransportError::Wait)?;

        Ok(CurlOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            exit_code: output.status.code(),
        })
    }
}

#[async_trait]
impl Transport for CurlTransport {
    async fn exchange(&self, request: &ApiRequest, bearer: Option<&str>) -> Exchange {
        debug!("curl {}", request.label());

        let output = match self.run(request, bearer).await {
            Ok(output) => output,
            Err(e) => {
                warn!("{} failed: {}", request.label(), e);
                return Exchange::failed(e.to_string());
            }
        };

        let mut exchange = split_combined_output(&output.stdout);

        // curl reports `000` and exits non-zero when no response arrived
        if exchange.status == 0 && exchange.body.is_empty() && output.exit_code != Some(0) {
            let message = if output.stderr.is_empty() {
                match output.exit_code {
                    Some(code) => format!("curl exited with code {code}"),
                    None => "curl terminated by signal".to_string(),
                }
            } else {
                output.stderr
            };
            warn!("{} failed: {}", request.label(), message);
            exchange.body = Body::TransportError(message);
        }

        debug!("{} -> {}", request.label(), exchange.status);
        exchange
    }
}
