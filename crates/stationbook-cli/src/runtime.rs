// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use stationbook_app::{AccountService, RemoteCompletion, RemoteRequest};
use stationbook_tui::{AppRuntime, InternalEvent};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

pub type SharedService = Arc<dyn AccountService + Send + Sync>;

/// Runs each directory request on its own worker thread.
pub struct ServiceRuntime {
    service: SharedService,
}

impl ServiceRuntime {
    pub fn new(service: SharedService) -> Self {
        Self { service }
    }
}

impl AppRuntime for ServiceRuntime {
    fn run_request(&mut self, request: &RemoteRequest) -> RemoteCompletion {
        stationbook_app::execute(self.service.as_ref(), request)
    }

    fn spawn_request(&mut self, request: RemoteRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let service = Arc::clone(&self.service);
        let name = format!("accounts-{}-{}", request.op.name(), request.id);
        thread::Builder::new()
            .name(name)
            .spawn(move || {
                let completion = stationbook_app::execute(service.as_ref(), &request);
                if tx.send(InternalEvent::Remote(completion)).is_err() {
                    tracing::debug!(request_id = %request.id, "event loop gone; dropping completion");
                }
            })
            .context("spawn accounts request worker")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ServiceRuntime;
    use anyhow::Result;
    use stationbook_app::{
        AccountFields, AccountId, RemoteCompletion, RemoteOp, RemoteOutcome, RemoteRequest,
        RequestId,
    };
    use stationbook_testkit::{AccountFaker, MemoryAccountService};
    use stationbook_tui::{AppRuntime, InternalEvent};
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::time::Duration;

    fn runtime_with(service: MemoryAccountService) -> (ServiceRuntime, Arc<MemoryAccountService>) {
        let service = Arc::new(service);
        (ServiceRuntime::new(service.clone()), service)
    }

    #[test]
    fn run_request_lists_accounts_inline() {
        let (mut runtime, _service) =
            runtime_with(MemoryAccountService::with_accounts(AccountFaker::new(5).accounts(3)));
        let completion = runtime.run_request(&RemoteRequest {
            id: RequestId::new(1),
            op: RemoteOp::List,
        });
        match completion.result {
            Ok(RemoteOutcome::Listed(accounts)) => assert_eq!(accounts.len(), 3),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn spawned_request_reports_on_channel() -> Result<()> {
        let (mut runtime, service) = runtime_with(MemoryAccountService::new());
        let (tx, rx) = mpsc::channel();
        runtime.spawn_request(
            RemoteRequest {
                id: RequestId::new(7),
                op: RemoteOp::Create(AccountFields {
                    site_name: "Depot".to_owned(),
                    service_station: "Shell".to_owned(),
                    account_number: "1001".to_owned(),
                }),
            },
            tx,
        )?;

        let event = rx.recv_timeout(Duration::from_secs(5))?;
        let InternalEvent::Remote(RemoteCompletion { request_id, result }) = event else {
            panic!("remote completion expected");
        };
        assert_eq!(request_id, RequestId::new(7));
        let Ok(RemoteOutcome::Created(account)) = result else {
            panic!("created outcome expected");
        };
        assert_eq!(account.id, AccountId::new(1));
        assert_eq!(service.snapshot().len(), 1);
        Ok(())
    }

    #[test]
    fn spawned_failure_carries_error_text() -> Result<()> {
        let (mut runtime, service) = runtime_with(MemoryAccountService::new());
        service.fail_next("cannot reach http://localhost:8080");
        let (tx, rx) = mpsc::channel();
        runtime.spawn_request(
            RemoteRequest {
                id: RequestId::new(2),
                op: RemoteOp::Delete(AccountId::new(4)),
            },
            tx,
        )?;

        let event = rx.recv_timeout(Duration::from_secs(5))?;
        assert_eq!(
            event,
            InternalEvent::Remote(RemoteCompletion {
                request_id: RequestId::new(2),
                result: Err("cannot reach http://localhost:8080".to_owned()),
            })
        );
        Ok(())
    }
}
