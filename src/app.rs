use std::sync::Arc;

use crate::application::{JobEvent, JobRunner};
use crate::config::AppConfig;
use crate::domain::{AppError, DownloadRequest};
use crate::loader::{InstaloaderCli, PostLoader};
use crate::ui::{DownloadMessage, DownloadView};
use futures::StreamExt;
use iced::Task;
use tracing::{error, info};

pub struct DownloadApp {
    view: DownloadView,
    runner: JobRunner,
    dependency: DependencyState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DependencyState {
    Checking,
    Available,
    Missing(String),
}

impl DownloadApp {
    pub fn new(config: AppConfig) -> (Self, Task<Message>) {
        let loader = Arc::new(InstaloaderCli::new(
            config.instaloader_program.clone(),
            config.download_root.clone(),
        ));
        Self::with_loader(&config, loader)
    }

    /// Build the app around any loader and check for it in the background.
    pub fn with_loader(config: &AppConfig, loader: Arc<dyn PostLoader>) -> (Self, Task<Message>) {
        let runner = JobRunner::new(loader);
        let view = DownloadView {
            username: config.username.clone(),
            password: config.password.clone(),
            download_root: config.download_root.display().to_string(),
            status_message: format!("Checking for {}...", runner.loader_name()),
            ..Default::default()
        };

        let checker = runner.clone();
        let app = Self {
            view,
            runner,
            dependency: DependencyState::Checking,
        };

        (
            app,
            Task::perform(
                async move { checker.check_dependency().await },
                Message::DependencyChecked,
            ),
        )
    }

    fn start_download(&mut self) -> Task<Message> {
        if self.dependency != DependencyState::Available {
            return Task::none();
        }

        let request = match DownloadRequest::from_form(
            &self.view.post_link,
            &self.view.username,
            &self.view.password,
        ) {
            Ok(request) => request,
            Err(e) => {
                self.view.input_error = Some(e.to_string());
                return Task::none();
            }
        };

        match self.runner.start(request) {
            Ok(stream) => {
                self.view.input_error = None;
                self.view.status_message = "Downloading...".to_string();
                Task::stream(stream.map(Message::Job))
            }
            Err(e) => {
                self.view.input_error = Some(e.to_string());
                Task::none()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    /// Result of looking for the download library at startup
    DependencyChecked(Result<String, AppError>),
    Job(JobEvent),
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::DownloadPressed => return app.start_download(),
                DownloadMessage::ClearLogPressed => {
                    if app.runner.is_running() {
                        app.runner.clear_log();
                    } else if app.runner.reset().is_ok()
                        && app.dependency == DependencyState::Available
                    {
                        app.view.status_message = "Idle".to_string();
                    }
                }
                _ => {}
            }
        }
        Message::DependencyChecked(result) => match result {
            Ok(version) => {
                info!("Using {} {}", app.runner.loader_name(), version);
                app.dependency = DependencyState::Available;
                app.view.ready = true;
                app.view.status_message = "Idle".to_string();
            }
            Err(e) => {
                error!("{}", e);
                let message = match e {
                    AppError::MissingDependency(message) => message,
                    other => other.to_string(),
                };
                app.dependency = DependencyState::Missing(message);
            }
        },
        Message::Job(JobEvent::Log(_)) => {
            // The log panel reads straight from the runner's sink
        }
        Message::Job(JobEvent::Finished(result)) => {
            match result {
                Ok(path) => {
                    app.view.status_message =
                        format!("Download complete. Post saved to: {}", path.display());
                }
                Err(_) => {
                    app.view.status_message = "Failed".to_string();
                }
            }
        }
    }
    Task::none()
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    match &app.dependency {
        DependencyState::Missing(message) => {
            DownloadView::missing_dependency_view(message).map(Message::UiMessage)
        }
        DependencyState::Checking | DependencyState::Available => app
            .view
            .view(app.runner.snapshot())
            .map(Message::UiMessage),
    }
}
