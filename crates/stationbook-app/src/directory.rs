// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use crate::{Account, AccountFields, AccountForm, AccountId, FormField, FormKind, RequestId};

/// How the directory treats a mutation aimed at a record that already has an
/// update or delete outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Send every request; whichever response lands last decides the record.
    #[default]
    LastResponseWins,
    /// Refuse a second update/delete for a record until the first completes.
    OnePerRecord,
}

impl OverlapPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LastResponseWins => "last_response_wins",
            Self::OnePerRecord => "one_per_record",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "last_response_wins" => Some(Self::LastResponseWins),
            "one_per_record" => Some(Self::OnePerRecord),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOp {
    List,
    Create(AccountFields),
    Update {
        id: AccountId,
        fields: AccountFields,
    },
    Delete(AccountId),
}

impl RemoteOp {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Create(_) => "create",
            Self::Update { .. } => "update",
            Self::Delete(_) => "delete",
        }
    }

    /// The record a mutation is aimed at. Lists and creates have none.
    pub const fn target(&self) -> Option<&AccountId> {
        match self {
            Self::Update { id, .. } | Self::Delete(id) => Some(id),
            Self::List | Self::Create(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRequest {
    pub id: RequestId,
    pub op: RemoteOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOutcome {
    Listed(Vec<Account>),
    Created(Account),
    Updated(Account),
    Deleted(AccountId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCompletion {
    pub request_id: RequestId,
    pub result: Result<RemoteOutcome, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    RowMenu,
    CreateForm,
    EditForm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub account_id: AccountId,
    pub form: AccountForm,
}

// A create form remembers the request its last submit issued, so a late
// response only closes the form that sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CreateSession {
    form: AccountForm,
    submitted: Option<RequestId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryCommand {
    Load,
    Search(String),
    OpenRowMenu(AccountId),
    CloseRowMenu,
    OpenCreateForm,
    CloseCreateForm,
    SubmitCreate,
    OpenEditForm(AccountId),
    CloseEditForm,
    SubmitEdit,
    Remove(AccountId),
    EditField {
        form: FormKind,
        field: FormField,
        value: String,
    },
    DismissAlert,
    Complete(RemoteCompletion),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryEvent {
    LoadingChanged(bool),
    RequestIssued(RemoteRequest),
    RequestRejected {
        op: &'static str,
        account_id: AccountId,
    },
    ValidationFailed(String),
    RemoteFailed {
        op: &'static str,
        error: String,
    },
    AccountsChanged {
        total: usize,
        visible: usize,
    },
    FilterChanged {
        visible: usize,
    },
    ModalChanged {
        modal: Modal,
        open: bool,
    },
    SelectionChanged(Option<AccountId>),
    FormEdited(FormKind),
    AlertDismissed,
    Notice(String),
}

pub const VALIDATION_ALERT: &str = "Please fill all fields";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryState {
    accounts: Vec<Account>,
    filtered: Vec<Account>,
    query: String,
    loading: bool,
    selected: Option<AccountId>,
    row_menu_open: bool,
    create: Option<CreateSession>,
    edit: Option<EditSession>,
    alert: Option<String>,
    pending: BTreeMap<RequestId, RemoteOp>,
    next_request_id: i64,
    overlap: OverlapPolicy,
}

impl Default for DirectoryState {
    fn default() -> Self {
        Self::new(OverlapPolicy::default())
    }
}

impl DirectoryState {
    pub fn new(overlap: OverlapPolicy) -> Self {
        Self {
            accounts: Vec::new(),
            filtered: Vec::new(),
            query: String::new(),
            loading: false,
            selected: None,
            row_menu_open: false,
            create: None,
            edit: None,
            alert: None,
            pending: BTreeMap::new(),
            next_request_id: 1,
            overlap,
        }
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn filtered(&self) -> &[Account] {
        &self.filtered
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn selected(&self) -> Option<&AccountId> {
        self.selected.as_ref()
    }

    pub fn selected_account(&self) -> Option<&Account> {
        let id = self.selected.as_ref()?;
        self.find(id)
    }

    pub fn is_open(&self, modal: Modal) -> bool {
        match modal {
            Modal::RowMenu => self.row_menu_open,
            Modal::CreateForm => self.create.is_some(),
            Modal::EditForm => self.edit.is_some(),
        }
    }

    pub fn create_form(&self) -> Option<&AccountForm> {
        self.create.as_ref().map(|session| &session.form)
    }

    pub fn edit_session(&self) -> Option<&EditSession> {
        self.edit.as_ref()
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn overlap_policy(&self) -> OverlapPolicy {
        self.overlap
    }

    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    pub fn has_pending_mutation(&self, id: &AccountId) -> bool {
        self.pending.values().any(|op| op.target() == Some(id))
    }

    pub fn dispatch(&mut self, command: DirectoryCommand) -> Vec<DirectoryEvent> {
        match command {
            DirectoryCommand::Load => self.begin_load(),
            DirectoryCommand::Search(text) => {
                self.query = text;
                self.refilter();
                vec![DirectoryEvent::FilterChanged {
                    visible: self.filtered.len(),
                }]
            }
            DirectoryCommand::OpenRowMenu(id) => self.open_row_menu(id),
            DirectoryCommand::CloseRowMenu => self.close_row_menu().into_iter().collect(),
            DirectoryCommand::OpenCreateForm => {
                if self.create.is_some() {
                    return Vec::new();
                }
                self.create = Some(CreateSession {
                    form: AccountForm::default(),
                    submitted: None,
                });
                vec![DirectoryEvent::ModalChanged {
                    modal: Modal::CreateForm,
                    open: true,
                }]
            }
            DirectoryCommand::CloseCreateForm => self.close_create_form().into_iter().collect(),
            DirectoryCommand::SubmitCreate => self.submit_create(),
            DirectoryCommand::OpenEditForm(id) => self.open_edit_form(id),
            DirectoryCommand::CloseEditForm => self.close_edit_form().into_iter().collect(),
            DirectoryCommand::SubmitEdit => self.submit_edit(),
            DirectoryCommand::Remove(id) => self.begin_remove(id),
            DirectoryCommand::EditField { form, field, value } => {
                self.edit_field(form, field, value)
            }
            DirectoryCommand::DismissAlert => {
                if self.alert.take().is_some() {
                    vec![DirectoryEvent::AlertDismissed]
                } else {
                    Vec::new()
                }
            }
            DirectoryCommand::Complete(completion) => self.complete(completion),
        }
    }

    fn find(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.iter().find(|account| &account.id == id)
    }

    // The only place the filtered list is written.
    fn refilter(&mut self) {
        self.filtered = self
            .accounts
            .iter()
            .filter(|account| account.matches_query(&self.query))
            .cloned()
            .collect();
    }

    fn accounts_changed(&mut self) -> DirectoryEvent {
        self.refilter();
        DirectoryEvent::AccountsChanged {
            total: self.accounts.len(),
            visible: self.filtered.len(),
        }
    }

    fn issue(&mut self, op: RemoteOp) -> DirectoryEvent {
        DirectoryEvent::RequestIssued(self.next_request(op))
    }

    fn next_request(&mut self, op: RemoteOp) -> RemoteRequest {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id = self.next_request_id.saturating_add(1);
        tracing::debug!(request_id = %id, op = op.name(), "issuing accounts request");
        self.pending.insert(id, op.clone());
        RemoteRequest { id, op }
    }

    fn check_overlap(&self, op: &'static str, id: &AccountId) -> Option<DirectoryEvent> {
        if self.overlap == OverlapPolicy::OnePerRecord && self.has_pending_mutation(id) {
            tracing::warn!(
                account_id = %id,
                op,
                "refusing request; another mutation for this account is in flight"
            );
            return Some(DirectoryEvent::RequestRejected {
                op,
                account_id: id.clone(),
            });
        }
        None
    }

    fn begin_load(&mut self) -> Vec<DirectoryEvent> {
        let mut events = Vec::new();
        if !self.loading {
            self.loading = true;
            events.push(DirectoryEvent::LoadingChanged(true));
        }
        events.push(self.issue(RemoteOp::List));
        events
    }

    fn open_row_menu(&mut self, id: AccountId) -> Vec<DirectoryEvent> {
        if self.find(&id).is_none() {
            return vec![DirectoryEvent::Notice(format!(
                "account {id} is no longer listed"
            ))];
        }
        self.selected = Some(id.clone());
        self.row_menu_open = true;
        vec![
            DirectoryEvent::SelectionChanged(Some(id)),
            DirectoryEvent::ModalChanged {
                modal: Modal::RowMenu,
                open: true,
            },
        ]
    }

    fn close_row_menu(&mut self) -> Option<DirectoryEvent> {
        if !self.row_menu_open {
            return None;
        }
        self.row_menu_open = false;
        Some(DirectoryEvent::ModalChanged {
            modal: Modal::RowMenu,
            open: false,
        })
    }

    fn close_create_form(&mut self) -> Option<DirectoryEvent> {
        self.create.take()?;
        Some(DirectoryEvent::ModalChanged {
            modal: Modal::CreateForm,
            open: false,
        })
    }

    fn close_edit_form(&mut self) -> Option<DirectoryEvent> {
        self.edit.take()?;
        Some(DirectoryEvent::ModalChanged {
            modal: Modal::EditForm,
            open: false,
        })
    }

    fn open_edit_form(&mut self, id: AccountId) -> Vec<DirectoryEvent> {
        let Some(account) = self.find(&id) else {
            return vec![DirectoryEvent::Notice(format!(
                "account {id} is no longer listed"
            ))];
        };
        let form = AccountForm::from_account(account);

        let mut events: Vec<DirectoryEvent> = self.close_row_menu().into_iter().collect();
        self.selected = Some(id.clone());
        self.edit = Some(EditSession {
            account_id: id.clone(),
            form,
        });
        events.push(DirectoryEvent::SelectionChanged(Some(id)));
        events.push(DirectoryEvent::ModalChanged {
            modal: Modal::EditForm,
            open: true,
        });
        events
    }

    fn fail_validation(&mut self, error: anyhow::Error) -> Vec<DirectoryEvent> {
        let message = error.to_string();
        self.alert = Some(format!("{VALIDATION_ALERT}: {message}"));
        vec![DirectoryEvent::ValidationFailed(message)]
    }

    fn submit_create(&mut self) -> Vec<DirectoryEvent> {
        let Some(session) = &self.create else {
            return vec![DirectoryEvent::Notice("create form is not open".to_owned())];
        };
        let fields = match session.form.validate() {
            Ok(fields) => fields,
            Err(error) => return self.fail_validation(error),
        };
        let request = self.next_request(RemoteOp::Create(fields));
        if let Some(session) = self.create.as_mut() {
            session.submitted = Some(request.id);
        }
        vec![DirectoryEvent::RequestIssued(request)]
    }

    fn submit_edit(&mut self) -> Vec<DirectoryEvent> {
        let Some(session) = &self.edit else {
            return vec![DirectoryEvent::Notice("edit form is not open".to_owned())];
        };
        let id = session.account_id.clone();
        let fields = match session.form.validate() {
            Ok(fields) => fields,
            Err(error) => return self.fail_validation(error),
        };
        if let Some(rejected) = self.check_overlap("update", &id) {
            return vec![rejected];
        }
        vec![self.issue(RemoteOp::Update { id, fields })]
    }

    fn begin_remove(&mut self, id: AccountId) -> Vec<DirectoryEvent> {
        if let Some(rejected) = self.check_overlap("delete", &id) {
            return vec![rejected];
        }
        vec![self.issue(RemoteOp::Delete(id))]
    }

    fn edit_field(&mut self, kind: FormKind, field: FormField, value: String) -> Vec<DirectoryEvent> {
        let form = match kind {
            FormKind::Create => self.create.as_mut().map(|session| &mut session.form),
            FormKind::Edit => self.edit.as_mut().map(|session| &mut session.form),
        };
        let Some(form) = form else {
            return vec![DirectoryEvent::Notice(format!(
                "{} form is not open",
                match kind {
                    FormKind::Create => "create",
                    FormKind::Edit => "edit",
                }
            ))];
        };
        form.set(field, value);
        vec![DirectoryEvent::FormEdited(kind)]
    }

    fn complete(&mut self, completion: RemoteCompletion) -> Vec<DirectoryEvent> {
        let request_id = completion.request_id;
        let Some(op) = self.pending.remove(&request_id) else {
            tracing::debug!(%request_id, "ignoring completion for unknown request");
            return Vec::new();
        };

        let mut events = Vec::new();
        match (op, completion.result) {
            (RemoteOp::List, Ok(RemoteOutcome::Listed(accounts))) => {
                tracing::info!(count = accounts.len(), "accounts loaded");
                self.accounts = accounts;
                events.push(self.accounts_changed());
                events.extend(self.finish_load());
            }
            (RemoteOp::Create(_), Ok(RemoteOutcome::Created(account))) => {
                tracing::info!(account_id = %account.id, "account created");
                match self.accounts.iter_mut().find(|row| row.id == account.id) {
                    Some(existing) => {
                        tracing::warn!(
                            account_id = %account.id,
                            "server returned an id already listed; replacing it"
                        );
                        *existing = account;
                    }
                    None => self.accounts.push(account),
                }
                events.push(self.accounts_changed());
                let submitted_here = self
                    .create
                    .as_ref()
                    .is_some_and(|session| session.submitted == Some(request_id));
                if submitted_here {
                    events.extend(self.close_create_form());
                }
            }
            (RemoteOp::Update { id, .. }, Ok(RemoteOutcome::Updated(account))) => {
                tracing::info!(account_id = %id, "account updated");
                if let Some(existing) = self.accounts.iter_mut().find(|row| row.id == id) {
                    *existing = account;
                    events.push(self.accounts_changed());
                } else {
                    tracing::warn!(account_id = %id, "updated account is no longer listed");
                }
                if self.edit.as_ref().map(|session| &session.account_id) == Some(&id) {
                    events.extend(self.close_edit_form());
                }
            }
            (RemoteOp::Delete(id), Ok(RemoteOutcome::Deleted(_))) => {
                tracing::info!(account_id = %id, "account deleted");
                let before = self.accounts.len();
                self.accounts.retain(|row| row.id != id);
                if self.accounts.len() != before {
                    events.push(self.accounts_changed());
                }
                if self.selected.as_ref() == Some(&id) {
                    self.selected = None;
                    events.push(DirectoryEvent::SelectionChanged(None));
                }
                events.extend(self.close_row_menu());
            }
            (op, result) => {
                let error = match result {
                    Err(error) => error,
                    Ok(outcome) => format!("unexpected response {outcome:?}"),
                };
                let name = op.name();
                tracing::error!(op = name, error = %error, "accounts request failed");
                events.push(DirectoryEvent::RemoteFailed { op: name, error });
                match op {
                    RemoteOp::List => events.extend(self.finish_load()),
                    RemoteOp::Delete(_) => events.extend(self.close_row_menu()),
                    RemoteOp::Create(_) | RemoteOp::Update { .. } => {}
                }
            }
        }
        events
    }

    fn finish_load(&mut self) -> Option<DirectoryEvent> {
        let still_loading = self.pending.values().any(|op| *op == RemoteOp::List);
        if self.loading && !still_loading {
            self.loading = false;
            return Some(DirectoryEvent::LoadingChanged(false));
        }
        None
    }
}

/// Requests the caller must hand to the accounts service.
pub fn issued_requests(events: &[DirectoryEvent]) -> Vec<RemoteRequest> {
    events
        .iter()
        .filter_map(|event| match event {
            DirectoryEvent::RequestIssued(request) => Some(request.clone()),
            _ => None,
        })
        .collect()
}
