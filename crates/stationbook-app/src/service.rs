// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::{
    Account, AccountFields, AccountId, RemoteCompletion, RemoteOp, RemoteOutcome, RemoteRequest,
};

/// The remote accounts collection as seen by the directory.
pub trait AccountService {
    fn list_accounts(&self) -> Result<Vec<Account>>;
    fn create_account(&self, fields: &AccountFields) -> Result<Account>;
    fn update_account(&self, id: &AccountId, fields: &AccountFields) -> Result<Account>;
    fn delete_account(&self, id: &AccountId) -> Result<()>;
}

/// Runs one issued request and folds any failure into the completion.
pub fn execute<S: AccountService + ?Sized>(service: &S, request: &RemoteRequest) -> RemoteCompletion {
    let result = match &request.op {
        RemoteOp::List => service.list_accounts().map(RemoteOutcome::Listed),
        RemoteOp::Create(fields) => service.create_account(fields).map(RemoteOutcome::Created),
        RemoteOp::Update { id, fields } => service
            .update_account(id, fields)
            .map(RemoteOutcome::Updated),
        RemoteOp::Delete(id) => service
            .delete_account(id)
            .map(|()| RemoteOutcome::Deleted(id.clone())),
    };
    RemoteCompletion {
        request_id: request.id,
        result: result.map_err(|error| format!("{error:#}")),
    }
}
