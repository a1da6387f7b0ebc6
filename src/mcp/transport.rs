//! Transport layer for MCP communication
//!
//! A transport is a reliable, ordered, bidirectional channel carrying
//! JSON-RPC envelopes. Sending and receiving are separate operations so
//! the session can match responses by correlation id rather than arrival
//! order.

use std::collections::VecDeque;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::config::TransportConfig;
use crate::mcp::types::{JsonRpcRequest, JsonRpcResponse};

/// Transport trait for MCP communication
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request or notification.
    async fn send(&self, request: &JsonRpcRequest) -> Result<(), TransportError>;

    /// Receive the next response, in whatever order the server produced
    /// them.
    async fn recv(&self) -> Result<JsonRpcResponse, TransportError>;

    /// Close the transport. Idempotent.
    async fn close(&self) -> Result<(), TransportError>;
}

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Connection closed")]
    Closed,
}

/// Build a transport from configuration.
pub async fn connect(config: &TransportConfig) -> Result<Box<dyn Transport>, TransportError> {
    match config {
        TransportConfig::Stdio { command, args } => {
            Ok(Box::new(StdioTransport::spawn(command, args).await?))
        }
        TransportConfig::Http { url } => Ok(Box::new(HttpTransport::new(url.clone())?)),
    }
}

/// Reader for newline-delimited JSON frames.
///
/// The partial-line buffer lives here rather than on the stack of `recv`:
/// `read_until` appends into it, so a read cancelled by a caller-side
/// deadline keeps the bytes already consumed and the next read completes
/// the frame instead of parsing a truncated one.
struct FrameReader<R> {
    reader: BufReader<R>,
    partial: Vec<u8>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            partial: Vec::new(),
        }
    }

    /// Read the next non-empty frame.
    async fn next_frame(&mut self) -> Result<JsonRpcResponse, TransportError> {
        loop {
            if self.partial.last() != Some(&b'\n') {
                let n = self.reader.read_until(b'\n', &mut self.partial).await?;
                if n == 0 {
                    return Err(TransportError::Closed);
                }
                if self.partial.last() != Some(&b'\n') {
                    // EOF mid-frame; the next read reports Closed.
                    continue;
                }
            }

            let line = String::from_utf8(std::mem::take(&mut self.partial))
                .map_err(|e| TransportError::Process(format!("non-UTF-8 frame: {}", e)))?;
            if line.trim().is_empty() {
                continue;
            }
            return Ok(serde_json::from_str(&line)?);
        }
    }
}

/// Stdio transport: spawns the server as a subprocess and exchanges
/// newline-delimited JSON over its stdin/stdout.
pub struct StdioTransport {
    child: Mutex<Option<Child>>,
    stdin: Mutex<Option<tokio::process::ChildStdin>>,
    stdout: Mutex<Option<FrameReader<tokio::process::ChildStdout>>>,
}

impl StdioTransport {
    /// Spawn the server process. Its stderr is inherited so server logs
    /// stay visible.
    pub async fn spawn(command: &str, args: &[String]) -> Result<Self, TransportError> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::Process("failed to capture stdin".to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::Process("failed to capture stdout".to_string()))?;

        Ok(Self {
            child: Mutex::new(Some(child)),
            stdin: Mutex::new(Some(stdin)),
            stdout: Mutex::new(Some(FrameReader::new(stdout))),
        })
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn send(&self, request: &JsonRpcRequest) -> Result<(), TransportError> {
        let mut guard = self.stdin.lock().await;
        let stdin = guard.as_mut().ok_or(TransportError::Closed)?;

        let mut line = serde_json::to_string(request)?;
        line.push('\n');
        stdin.write_all(line.as_bytes()).await?;
        stdin.flush().await?;
        Ok(())
    }

    async fn recv(&self) -> Result<JsonRpcResponse, TransportError> {
        let mut guard = self.stdout.lock().await;
        let frames = guard.as_mut().ok_or(TransportError::Closed)?;
        frames.next_frame().await
    }

    async fn close(&self) -> Result<(), TransportError> {
        *self.stdin.lock().await = None;
        *self.stdout.lock().await = None;

        if let Some(mut child) = self.child.lock().await.take() {
            child.kill().await?;
        }

        Ok(())
    }
}

/// HTTP transport: POSTs each envelope to a fixed URL. The paired HTTP
/// response body is queued so `recv` keeps the same contract as the
/// stream transports.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    queue: Mutex<VecDeque<JsonRpcResponse>>,
    closed: Mutex<bool>,
}

impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(url: String) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(Self {
            client,
            url,
            queue: Mutex::new(VecDeque::new()),
            closed: Mutex::new(false),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &JsonRpcRequest) -> Result<(), TransportError> {
        if *self.closed.lock().await {
            return Err(TransportError::Closed);
        }

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Http(format!("HTTP {}: {}", status, body)));
        }

        // Notifications get no response body worth queueing.
        if request.id.is_none() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        let parsed: JsonRpcResponse = serde_json::from_str(&body)?;
        self.queue.lock().await.push_back(parsed);
        Ok(())
    }

    async fn recv(&self) -> Result<JsonRpcResponse, TransportError> {
        if *self.closed.lock().await {
            return Err(TransportError::Closed);
        }
        self.queue
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| TransportError::Process("no pending response".to_string()))
    }

    async fn close(&self) -> Result<(), TransportError> {
        *self.closed.lock().await = true;
        self.queue.lock().await.clear();
        Ok(())
    }
}
