/// Execution Gateway
///
/// **Core Responsibility:**
/// Submit one synthesized program to the remote execution endpoint and
/// return its raw combined output.
///
/// **Critical Architectural Boundary:**
/// - Gateway knows HOW to reach the sandbox (HTTP, request shape, timeouts)
/// - Gateway does NOT know about test cases or markers
/// - Gateway does NOT evaluate correctness
///
/// **Failure Rules:**
/// - Non-2xx: the endpoint's `message` is surfaced verbatim
/// - Body without a run stage: `NoRunResult`, never fabricated empty output
/// - Transport errors and the caller-side timeout are terminal; no retries

use crate::driver::SynthesizedProgram;
use arbiter_common::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Raw outcome of the run phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Combined stdout/stderr, in the order the endpoint captured it
    pub output: String,
    pub code: Option<i64>,
    pub signal: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("execution endpoint did not answer within {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("failed to reach execution endpoint: {0}")]
    Transport(String),
    #[error("{message}")]
    Remote { status: u16, message: String },
    #[error("malformed response from execution endpoint: {0}")]
    MalformedResponse(String),
    #[error("execution endpoint returned no run result")]
    NoRunResult { compile_output: Option<String> },
}

impl GatewayError {
    /// Text surfaced to the caller as `compilerOutput`
    pub fn compiler_output(&self) -> String {
        match self {
            GatewayError::NoRunResult {
                compile_output: Some(output),
            } if !output.trim().is_empty() => output.trim().to_string(),
            other => other.to_string(),
        }
    }
}

/// Anything that can run a synthesized program.
///
/// Production uses `ExecutionGateway`; tests substitute canned output.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    async fn execute(&self, program: &SynthesizedProgram) -> Result<ExecutionResult, GatewayError>;
}

#[derive(Debug, Serialize)]
struct SourceFile<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    language: &'a str,
    version: &'a str,
    files: [SourceFile<'a>; 1],
    stdin: &'a str,
    args: [&'a str; 0],
    compile_timeout: u64,
    run_timeout: u64,
}

#[derive(Debug, Deserialize)]
struct StageResult {
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
    #[serde(default)]
    output: String,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    signal: Option<String>,
}

impl StageResult {
    fn combined(&self) -> String {
        if !self.output.is_empty() {
            self.output.clone()
        } else {
            format!("{}{}", self.stdout, self.stderr)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    #[serde(default)]
    run: Option<StageResult>,
    #[serde(default)]
    compile: Option<StageResult>,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    message: String,
}

/// HTTP client for the remote execution endpoint
#[derive(Debug, Clone)]
pub struct ExecutionGateway {
    client: Client,
    endpoint: String,
    compile_timeout: Duration,
    run_timeout: Duration,
    request_timeout: Duration,
}

impl ExecutionGateway {
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(config.request_timeout)
            .user_agent(concat!("arbiter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            compile_timeout: config.compile_timeout,
            run_timeout: config.run_timeout,
            request_timeout: config.request_timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, program: &SynthesizedProgram) -> Result<ExecutionResult, GatewayError> {
        let request = ExecuteRequest {
            language: &program.language,
            version: &program.version,
            files: [SourceFile {
                content: &program.content,
            }],
            stdin: "",
            args: [],
            compile_timeout: self.compile_timeout.as_millis() as u64,
            run_timeout: self.run_timeout.as_millis() as u64,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<RemoteErrorBody>(&body) {
                Ok(err) => err.message,
                Err(_) if !body.trim().is_empty() => body.trim().to_string(),
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("execution endpoint error")
                    .to_string(),
            };
            return Err(GatewayError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ExecuteResponse = serde_json::from_str(&body)
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        match parsed.run {
            Some(run) => Ok(ExecutionResult {
                output: run.combined(),
                code: run.code,
                signal: run.signal,
            }),
            None => Err(GatewayError::NoRunResult {
                compile_output: parsed.compile.map(|c| c.combined()),
            }),
        }
    }
}

#[async_trait]
impl ExecutionBackend for ExecutionGateway {
    async fn execute(&self, program: &SynthesizedProgram) -> Result<ExecutionResult, GatewayError> {
        debug!(
            endpoint = %self.endpoint,
            language = %program.language,
            version = %program.version,
            source_size = program.content.len(),
            "Submitting program to execution endpoint"
        );

        let start = Instant::now();
        let outcome = match tokio::time::timeout(self.request_timeout, self.send(program)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.request_timeout)),
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &outcome {
            Ok(result) => info!(
                elapsed_ms,
                code = ?result.code,
                signal = ?result.signal,
                output_size = result.output.len(),
                "Execution endpoint returned"
            ),
            Err(e) => warn!(elapsed_ms, error = %e, "Execution endpoint call failed"),
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn config_for(endpoint: String) -> Config {
        Config {
            endpoint,
            ..Config::default()
        }
    }

    fn program() -> SynthesizedProgram {
        SynthesizedProgram {
            language: "javascript".to_string(),
            version: "18.15.0".to_string(),
            content: "console.log(1)".to_string(),
        }
    }

    #[tokio::test]
    async fn test_successful_run() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/execute")
            .match_body(Matcher::Json(json!({
                "language": "javascript",
                "version": "18.15.0",
                "files": [{"content": "console.log(1)"}],
                "stdin": "",
                "args": [],
                "compile_timeout": 10000,
                "run_timeout": 3000
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "language": "javascript",
                    "version": "18.15.0",
                    "run": {"stdout": "1\n", "stderr": "", "output": "1\n", "code": 0, "signal": null}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let gateway = ExecutionGateway::new(&config_for(format!("{}/execute", server.url()))).unwrap();
        let result = gateway.execute(&program()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.output, "1\n");
        assert_eq!(result.code, Some(0));
        assert_eq!(result.signal, None);
    }

    #[tokio::test]
    async fn test_signal_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/execute")
            .with_status(200)
            .with_body(r#"{"run": {"output": "partial", "code": null, "signal": "SIGKILL"}}"#)
            .create_async()
            .await;

        let gateway = ExecutionGateway::new(&config_for(format!("{}/execute", server.url()))).unwrap();
        let result = gateway.execute(&program()).await.unwrap();
        assert_eq!(result.output, "partial");
        assert_eq!(result.code, None);
        assert_eq!(result.signal.as_deref(), Some("SIGKILL"));
    }

    #[tokio::test]
    async fn test_remote_error_message_preserved() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/execute")
            .with_status(500)
            .with_body(r#"{"message": "runtime is unavailable"}"#)
            .create_async()
            .await;

        let gateway = ExecutionGateway::new(&config_for(format!("{}/execute", server.url()))).unwrap();
        let err = gateway.execute(&program()).await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::Remote {
                status: 500,
                message: "runtime is unavailable".to_string()
            }
        );
        assert_eq!(err.compiler_output(), "runtime is unavailable");
    }

    #[tokio::test]
    async fn test_remote_error_plain_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/execute")
            .with_status(429)
            .with_body("Requests limited to 5 per second")
            .create_async()
            .await;

        let gateway = ExecutionGateway::new(&config_for(format!("{}/execute", server.url()))).unwrap();
        let err = gateway.execute(&program()).await.unwrap_err();
        assert_eq!(err.compiler_output(), "Requests limited to 5 per second");
    }

    #[tokio::test]
    async fn test_remote_error_empty_body_uses_status_reason() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/execute")
            .with_status(503)
            .create_async()
            .await;

        let gateway = ExecutionGateway::new(&config_for(format!("{}/execute", server.url()))).unwrap();
        let err = gateway.execute(&program()).await.unwrap_err();
        assert_eq!(err.compiler_output(), "Service Unavailable");
    }

    #[tokio::test]
    async fn test_missing_run_stage() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/execute")
            .with_status(200)
            .with_body(r#"{"compile": {"output": "Main.java:3: error: ';' expected\n", "code": 1}}"#)
            .create_async()
            .await;

        let gateway = ExecutionGateway::new(&config_for(format!("{}/execute", server.url()))).unwrap();
        let err = gateway.execute(&program()).await.unwrap_err();
        assert!(matches!(err, GatewayError::NoRunResult { compile_output: Some(_) }));
        assert_eq!(err.compiler_output(), "Main.java:3: error: ';' expected");
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/execute")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let gateway = ExecutionGateway::new(&config_for(format!("{}/execute", server.url()))).unwrap();
        let err = gateway.execute(&program()).await.unwrap_err();
        assert!(matches!(err, GatewayError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        // Nothing listens on port 9 (discard) in the test environment
        let gateway = ExecutionGateway::new(&config_for("http://127.0.0.1:9/execute".to_string())).unwrap();
        let err = gateway.execute(&program()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_) | GatewayError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_hung_endpoint_times_out() {
        // Accept connections but never answer
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let holder = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = Config {
            endpoint: format!("http://{}/execute", addr),
            request_timeout: Duration::from_millis(200),
            ..Config::default()
        };
        let gateway = ExecutionGateway::new(&config).unwrap();
        let err = gateway.execute(&program()).await.unwrap_err();
        assert_eq!(err, GatewayError::Timeout(Duration::from_millis(200)));

        holder.abort();
    }
}
