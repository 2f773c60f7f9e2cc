use crate::domain::{JobSnapshot, JobStatus};
use iced::{
    widget::{button, column, container, row, scrollable, text, text_input, Column, Space},
    Element, Length,
};

/// Main view state
pub struct DownloadView {
    pub post_link: String,
    pub username: String,
    pub password: String,
    pub download_root: String,
    pub status_message: String,
    /// Validation problem shown under the form
    pub input_error: Option<String>,
    /// Set once the download library has been found
    pub ready: bool,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self {
            post_link: String::new(),
            username: String::new(),
            password: String::new(),
            download_root: String::new(),
            status_message: "Idle".to_string(),
            input_error: None,
            ready: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    PostLinkChanged(String),
    UsernameChanged(String),
    PasswordChanged(String),
    DownloadPressed,
    ClearLogPressed,
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::PostLinkChanged(link) => {
                self.post_link = link;
                self.input_error = None;
            }
            DownloadMessage::UsernameChanged(username) => {
                self.username = username;
                self.input_error = None;
            }
            DownloadMessage::PasswordChanged(password) => {
                self.password = password;
                self.input_error = None;
            }
            DownloadMessage::DownloadPressed | DownloadMessage::ClearLogPressed => {
                // Will be handled by the app
            }
        }
    }

    pub fn view(&self, job: JobSnapshot) -> Element<'_, DownloadMessage> {
        let credentials = row![
            column![
                text("Username (optional):").size(14),
                text_input("Username", &self.username)
                    .on_input(DownloadMessage::UsernameChanged)
                    .padding(8),
            ]
            .spacing(5)
            .width(Length::Fill),
            column![
                text("Password (optional):").size(14),
                text_input("Password", &self.password)
                    .on_input(DownloadMessage::PasswordChanged)
                    .secure(true)
                    .padding(8),
            ]
            .spacing(5)
            .width(Length::Fill),
        ]
        .spacing(10);

        let start_enabled = self.ready && job.status != JobStatus::Running;
        let actions = row![
            button("Download Post")
                .on_press_maybe(start_enabled.then_some(DownloadMessage::DownloadPressed))
                .padding([10, 20])
                .width(Length::Fill),
            button("Clear Log")
                .on_press(DownloadMessage::ClearLogPressed)
                .padding([10, 20])
                .width(Length::Fill),
        ]
        .spacing(10);

        let input_error: Element<'_, DownloadMessage> = match &self.input_error {
            Some(error) => text(error).size(14).style(text::danger).into(),
            None => Space::new().height(Length::Fixed(0.0)).into(),
        };

        let log_title = match &job.target {
            Some(target) => format!("Download Progress ({})", target),
            None => "Download Progress".to_string(),
        };

        let log = Column::with_children(
            job.log_lines
                .into_iter()
                .map(|line| text(line).size(13).into()),
        )
        .spacing(2);

        column![
            text("Instagram Post Downloader").size(28),
            Space::new().height(Length::Fixed(10.0)),
            text("Instagram Post Link:").size(14),
            text_input("https://www.instagram.com/p/...", &self.post_link)
                .on_input(DownloadMessage::PostLinkChanged)
                .on_submit(DownloadMessage::DownloadPressed)
                .padding(8),
            credentials,
            text(format!("Download folder: {}", self.download_root)).size(13),
            input_error,
            actions,
            text(&self.status_message).size(14),
            text(log_title).size(16),
            container(
                scrollable(log)
                    .anchor_bottom()
                    .width(Length::Fill)
                    .height(Length::Fill)
            )
            .padding(5)
            .style(container::bordered_box)
            .width(Length::Fill)
            .height(Length::Fill),
        ]
        .padding(20)
        .spacing(10)
        .into()
    }

    /// Shown instead of the form when the download library is unavailable.
    pub fn missing_dependency_view(message: &str) -> Element<'_, DownloadMessage> {
        column![
            text("Missing dependency").size(28),
            Space::new().height(Length::Fixed(20.0)),
            text(message).size(16),
        ]
        .padding(20)
        .spacing(10)
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editing_fields_clears_input_error() {
        let mut view = DownloadView {
            input_error: Some("Provide a valid Instagram post link or shortcode.".to_string()),
            ..Default::default()
        };
        view.update(DownloadMessage::PostLinkChanged("ABC123xyz".to_string()));
        assert_eq!(view.post_link, "ABC123xyz");
        assert!(view.input_error.is_none());
    }

    #[test]
    fn test_button_messages_leave_form_untouched() {
        let mut view = DownloadView {
            post_link: "ABC123xyz".to_string(),
            ..Default::default()
        };
        view.update(DownloadMessage::DownloadPressed);
        view.update(DownloadMessage::ClearLogPressed);
        assert_eq!(view.post_link, "ABC123xyz");
        assert_eq!(view.status_message, "Idle");
    }
}
