pub mod job_runner;
pub mod log_sink;

pub use job_runner::{JobEvent, JobRunner};
pub use log_sink::LogSink;
