use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{LoaderError, PostLoader, ProgressSender, Result};
use crate::domain::{DownloadRequest, Shortcode};
use crate::utils::format_log_line;

const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// Drives the `instaloader` command-line program as a child process.
pub struct InstaloaderCli {
    program: PathBuf,
    download_root: PathBuf,
}

impl InstaloaderCli {
    pub fn new(program: impl Into<PathBuf>, download_root: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            download_root: download_root.into(),
        }
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Posts land in `<root>/<owner>_<shortcode>`; comments and metadata
    /// JSON are not saved.
    ///
    /// The password goes on the command line because the program only
    /// accepts it there or from an interactive prompt. It is visible in the
    /// process table for the length of the download.
    fn build_args(&self, request: &DownloadRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--dirname-pattern".into(),
            self.download_root.join("{profile}_{shortcode}").into(),
            "--no-metadata-json".into(),
        ];

        if let Some(credentials) = &request.credentials {
            args.push("--login".into());
            args.push(credentials.username.clone().into());
            args.push("--password".into());
            args.push(credentials.password.clone().into());
        }

        // A leading dash selects a single post by shortcode
        args.push("--".into());
        args.push(format!("-{}", request.target.as_str()).into());
        args
    }

    /// The folder the post was written to, or the root when the program
    /// left none behind.
    async fn saved_post_dir(&self, target: &Shortcode) -> PathBuf {
        let suffix = format!("_{}", target.as_str());
        if let Ok(mut entries) = tokio::fs::read_dir(&self.download_root).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
                if is_dir && entry.file_name().to_string_lossy().ends_with(&suffix) {
                    return entry.path();
                }
            }
        }
        debug!("No post folder for {} under {}", target, self.download_root.display());
        self.download_root.clone()
    }

    fn spawn_error(&self, source: std::io::Error) -> LoaderError {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoaderError::NotInstalled {
                program: self.program_name(),
            }
        } else {
            LoaderError::Spawn {
                program: self.program_name(),
                source,
            }
        }
    }
}

#[async_trait]
impl PostLoader for InstaloaderCli {
    fn name(&self) -> &'static str {
        "instaloader"
    }

    async fn fetch(&self, request: DownloadRequest, progress: ProgressSender) -> Result<PathBuf> {
        info!("Starting instaloader download for: {}", request.target);

        let mut child = Command::new(&self.program)
            .args(self.build_args(&request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("instaloader stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("instaloader stderr was not captured"))?;

        let mut stdout = BufReader::new(stdout);
        let mut stderr = BufReader::new(stderr);
        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();
        let mut stdout_done = false;
        let mut stderr_done = false;
        let mut last_error = None;

        while !(stdout_done && stderr_done) {
            tokio::select! {
                line = read_lossy_line(&mut stdout, &mut stdout_buf), if !stdout_done => match line? {
                    Some(raw) => {
                        if let Some(line) = format_log_line(&raw) {
                            debug!("instaloader> {}", line);
                            let _ = progress.send(line);
                        }
                    }
                    None => stdout_done = true,
                },
                line = read_lossy_line(&mut stderr, &mut stderr_buf), if !stderr_done => match line? {
                    Some(raw) => {
                        if let Some(line) = format_log_line(&raw) {
                            warn!("instaloader stderr> {}", line);
                            let _ = progress.send(format!("Error: {}", line));
                            last_error = Some(line);
                        }
                    }
                    None => stderr_done = true,
                },
            }
        }

        let status = child.wait().await?;
        if status.success() {
            info!("instaloader finished for: {}", request.target);
            Ok(self.saved_post_dir(&request.target).await)
        } else {
            Err(LoaderError::Failed {
                code: status.code(),
                message: last_error.unwrap_or_else(|| format!("instaloader exited with {}", status)),
            })
        }
    }

    async fn check_available(&self) -> Result<String> {
        let output = tokio::time::timeout(
            VERSION_CHECK_TIMEOUT,
            Command::new(&self.program).arg("--version").output(),
        )
        .await
        .map_err(|_| LoaderError::Failed {
            code: None,
            message: format!("{} --version timed out", self.program_name()),
        })?
        .map_err(|e| self.spawn_error(e))?;

        if output.status.success() {
            let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
            info!("instaloader is available, version: {}", version);
            Ok(version)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("instaloader --version failed: {}", stderr);
            Err(LoaderError::Failed {
                code: output.status.code(),
                message: stderr,
            })
        }
    }
}

/// Read one line, replacing invalid UTF-8 instead of failing.
///
/// `buf` keeps a partial line across cancellation, so this is safe to use
/// as a `select!` branch.
async fn read_lossy_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let read = reader.read_until(b'\n', buf).await?;
    if read == 0 && buf.is_empty() {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf).into_owned();
    buf.clear();
    Ok(Some(line))
}
