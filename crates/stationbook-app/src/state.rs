// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{DetailsView, DirectoryCommand, DirectoryEvent, DirectoryState, OverlapPolicy};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Directory,
    Details(DetailsView),
}

impl Screen {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Directory => "Sites & Service Stations",
            Self::Details(_) => "Details",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub screen: Screen,
    pub directory: DirectoryState,
    pub status_line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Directory(DirectoryCommand),
    OpenDetails(Option<String>),
    CloseDetails,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Directory(DirectoryEvent),
    ScreenChanged,
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn new(overlap: OverlapPolicy) -> Self {
        Self {
            directory: DirectoryState::new(overlap),
            ..Self::default()
        }
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::Directory(command) => {
                let events = self.directory.dispatch(command);
                let mut out = Vec::with_capacity(events.len() + 1);
                let status = events.iter().rev().find_map(status_for_event);
                out.extend(events.into_iter().map(AppEvent::Directory));
                if let Some(message) = status {
                    out.push(self.set_status(&message));
                }
                out
            }
            AppCommand::OpenDetails(input) => {
                self.screen = Screen::Details(DetailsView::new(input));
                vec![AppEvent::ScreenChanged]
            }
            AppCommand::CloseDetails => {
                if self.screen == Screen::Directory {
                    return Vec::new();
                }
                self.screen = Screen::Directory;
                vec![AppEvent::ScreenChanged]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}

fn status_for_event(event: &DirectoryEvent) -> Option<String> {
    match event {
        DirectoryEvent::RemoteFailed { op, error } => Some(format!("{op} failed: {error}")),
        DirectoryEvent::RequestRejected { op, account_id } => Some(format!(
            "{op} skipped: account {account_id} already has a request in flight"
        )),
        DirectoryEvent::ValidationFailed(message) => Some(message.clone()),
        DirectoryEvent::Notice(message) => Some(message.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppState, Screen};
    use crate::{
        DETAILS_PLACEHOLDER, DirectoryCommand, DirectoryEvent, RemoteCompletion, issued_requests,
    };

    fn directory_events(events: &[AppEvent]) -> Vec<DirectoryEvent> {
        events
            .iter()
            .filter_map(|event| match event {
                AppEvent::Directory(event) => Some(event.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn open_and_close_details() {
        let mut state = AppState::default();

        let opened = state.dispatch(AppCommand::OpenDetails(Some("Shell".to_owned())));
        assert_eq!(opened, vec![AppEvent::ScreenChanged]);
        let Screen::Details(details) = &state.screen else {
            panic!("details screen expected");
        };
        assert_eq!(details.body(), "Shell");

        state.dispatch(AppCommand::CloseDetails);
        assert_eq!(state.screen, Screen::Directory);
        assert!(state.dispatch(AppCommand::CloseDetails).is_empty());
    }

    #[test]
    fn details_without_input_shows_placeholder() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::OpenDetails(None));
        let Screen::Details(details) = &state.screen else {
            panic!("details screen expected");
        };
        assert_eq!(details.body(), DETAILS_PLACEHOLDER);
    }

    #[test]
    fn remote_failure_updates_status_line() {
        let mut state = AppState::default();
        let events = state.dispatch(AppCommand::Directory(DirectoryCommand::Load));
        let request = issued_requests(&directory_events(&events))
            .pop()
            .expect("list request");

        let events = state.dispatch(AppCommand::Directory(DirectoryCommand::Complete(
            RemoteCompletion {
                request_id: request.id,
                result: Err("cannot reach http://localhost:8080".to_owned()),
            },
        )));
        assert_eq!(
            state.status_line.as_deref(),
            Some("list failed: cannot reach http://localhost:8080")
        );
        assert!(events.contains(&AppEvent::StatusUpdated(
            "list failed: cannot reach http://localhost:8080".to_owned()
        )));

        state.dispatch(AppCommand::ClearStatus);
        assert!(state.status_line.is_none());
    }

    #[test]
    fn quiet_directory_commands_leave_status_alone() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::SetStatus("ready".to_owned()));
        state.dispatch(AppCommand::Directory(DirectoryCommand::Search(
            "main".to_owned(),
        )));
        assert_eq!(state.status_line.as_deref(), Some("ready"));
    }
}
