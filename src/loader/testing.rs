use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::{LoaderError, PostLoader, ProgressSender, Result};
use crate::domain::DownloadRequest;

/// Test double that replays canned progress lines and a canned outcome.
pub struct ScriptedLoader {
    lines: Vec<String>,
    outcome: std::result::Result<PathBuf, String>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    requests: Mutex<Vec<DownloadRequest>>,
}

impl ScriptedLoader {
    pub fn succeeding(lines: &[&str]) -> Self {
        Self::new(lines, Ok(PathBuf::from("downloads/owner_ABC123xyz")))
    }

    pub fn failing(lines: &[&str], message: &str) -> Self {
        Self::new(lines, Err(message.to_string()))
    }

    fn new(lines: &[&str], outcome: std::result::Result<PathBuf, String>) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            outcome,
            gate: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Hold the download open after its lines are sent until the returned
    /// sender fires or is dropped.
    pub fn gated(mut self) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        self.gate = Mutex::new(Some(rx));
        (self, tx)
    }

    pub fn requests(&self) -> Vec<DownloadRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostLoader for ScriptedLoader {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch(&self, request: DownloadRequest, progress: ProgressSender) -> Result<PathBuf> {
        self.requests.lock().unwrap().push(request);
        let gate = self.gate.lock().unwrap().take();

        for line in &self.lines {
            let _ = progress.send(line.clone());
            tokio::task::yield_now().await;
        }

        if let Some(gate) = gate {
            let _ = gate.await;
        }

        self.outcome.clone().map_err(|message| LoaderError::Failed {
            code: Some(1),
            message,
        })
    }

    async fn check_available(&self) -> Result<String> {
        Ok("scripted 1.0".to_string())
    }
}
