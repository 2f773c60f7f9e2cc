pub mod error;
pub mod model;

pub use error::AppError;
pub use model::{Credentials, DownloadJob, DownloadRequest, JobSnapshot, JobStatus, Shortcode};
