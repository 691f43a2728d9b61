// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use stationbook_app::{Account, AccountFields, AccountId, AccountService};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
struct Inner {
    accounts: Vec<Account>,
    next_id: i64,
    fail_next: Option<String>,
    calls: Vec<&'static str>,
}

/// Accounts collection held in process memory. Backs `--demo` and tests.
#[derive(Debug)]
pub struct MemoryAccountService {
    inner: Mutex<Inner>,
}

impl Default for MemoryAccountService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAccountService {
    pub fn new() -> Self {
        Self::with_accounts(Vec::new())
    }

    pub fn with_accounts(accounts: Vec<Account>) -> Self {
        let next_id = accounts
            .iter()
            .filter_map(|account| account.id.as_number())
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            inner: Mutex::new(Inner {
                accounts,
                next_id,
                fail_next: None,
                calls: Vec::new(),
            }),
        }
    }

    pub fn snapshot(&self) -> Vec<Account> {
        self.lock().accounts.clone()
    }

    /// Operation names in the order they were called.
    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    /// Makes the next call fail with `message`, whatever the operation.
    pub fn fail_next(&self, message: &str) {
        self.lock().fail_next = Some(message.to_owned());
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn begin(&self, op: &'static str) -> Result<MutexGuard<'_, Inner>> {
        let mut inner = self.lock();
        inner.calls.push(op);
        if let Some(message) = inner.fail_next.take() {
            return Err(anyhow!(message));
        }
        Ok(inner)
    }
}

impl AccountService for MemoryAccountService {
    fn list_accounts(&self) -> Result<Vec<Account>> {
        let inner = self.begin("list")?;
        Ok(inner.accounts.clone())
    }

    fn create_account(&self, fields: &AccountFields) -> Result<Account> {
        let mut inner = self.begin("create")?;
        let id = AccountId::new(inner.next_id);
        inner.next_id += 1;
        let account = Account::with_fields(id, fields.clone());
        inner.accounts.push(account.clone());
        Ok(account)
    }

    fn update_account(&self, id: &AccountId, fields: &AccountFields) -> Result<Account> {
        let mut inner = self.begin("update")?;
        let slot = inner
            .accounts
            .iter_mut()
            .find(|account| &account.id == id)
            .ok_or_else(|| anyhow!("server error (404): account {id} not found"))?;
        *slot = Account::with_fields(id.clone(), fields.clone());
        Ok(slot.clone())
    }

    fn delete_account(&self, id: &AccountId) -> Result<()> {
        let mut inner = self.begin("delete")?;
        let before = inner.accounts.len();
        inner.accounts.retain(|account| &account.id != id);
        if inner.accounts.len() == before {
            return Err(anyhow!("server error (404): account {id} not found"));
        }
        Ok(())
    }
}
