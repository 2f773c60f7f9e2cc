use std::fmt;

use super::AppError;
use crate::utils::extract_shortcode;

/// Canonical post identifier, normalized from a link or a bare shortcode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shortcode(String);

impl Shortcode {
    pub fn parse(input: &str) -> Result<Self, AppError> {
        if input.trim().is_empty() {
            return Err(AppError::MissingLink);
        }
        extract_shortcode(input)
            .map(Self)
            .ok_or(AppError::InvalidInput)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Shortcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Build credentials from the raw form fields.
    ///
    /// The username is trimmed, the password is taken as typed. Two blank
    /// fields mean an anonymous download; a single filled field is rejected.
    pub fn from_fields(username: &str, password: &str) -> Result<Option<Self>, AppError> {
        let username = username.trim();
        match (username.is_empty(), password.is_empty()) {
            (true, true) => Ok(None),
            (false, false) => Ok(Some(Self {
                username: username.to_string(),
                password: password.to_string(),
            })),
            _ => Err(AppError::IncompleteCredentials),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What the download library is asked to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub target: Shortcode,
    pub credentials: Option<Credentials>,
}

impl DownloadRequest {
    /// Validate the form fields into a request.
    pub fn from_form(link: &str, username: &str, password: &str) -> Result<Self, AppError> {
        let target = Shortcode::parse(link)?;
        let credentials = Credentials::from_fields(username, password)?;
        Ok(Self {
            target,
            credentials,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Idle,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub target: Shortcode,
    pub credentials: Option<Credentials>,
    pub status: JobStatus,
}

impl DownloadJob {
    pub fn start(request: DownloadRequest) -> Self {
        Self {
            target: request.target,
            credentials: request.credentials,
            status: JobStatus::Running,
        }
    }
}

/// Point-in-time view of the current job and its log.
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub target: Option<Shortcode>,
    pub status: JobStatus,
    pub log_lines: Vec<String>,
}
