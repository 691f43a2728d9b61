// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use stationbook_app::{AccountFields, AccountId, AccountService};
use std::io::Read;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use tiny_http::{Header, Method, Request, Response, Server};

use crate::MemoryAccountService;

const COLLECTION_PATH: &str = "/api/accounts";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
}

/// Serves the accounts REST contract on a loopback port, backed by a
/// [`MemoryAccountService`]. Stops when dropped.
pub struct MockAccountServer {
    server: Arc<Server>,
    service: Arc<MemoryAccountService>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: Option<JoinHandle<()>>,
}

impl MockAccountServer {
    pub fn start(service: MemoryAccountService) -> Result<Self> {
        let server = Arc::new(
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?,
        );
        let service = Arc::new(service);
        let requests = Arc::new(Mutex::new(Vec::new()));

        let handle = {
            let server = Arc::clone(&server);
            let service = Arc::clone(&service);
            let requests = Arc::clone(&requests);
            thread::spawn(move || {
                for request in server.incoming_requests() {
                    handle_request(&service, &requests, request);
                }
            })
        };

        Ok(Self {
            server,
            service,
            requests,
            handle: Some(handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.server.server_addr())
    }

    pub fn service(&self) -> &MemoryAccountService {
        &self.service
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }
}

impl Drop for MockAccountServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn lock(requests: &Mutex<Vec<RecordedRequest>>) -> MutexGuard<'_, Vec<RecordedRequest>> {
    match requests.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn handle_request(
    service: &MemoryAccountService,
    requests: &Mutex<Vec<RecordedRequest>>,
    mut request: Request,
) {
    let mut body = String::new();
    if let Err(error) = request.as_reader().read_to_string(&mut body) {
        tracing::warn!(%error, "mock server could not read request body");
    }
    let method = request.method().clone();
    let url = request.url().to_owned();
    lock(requests).push(RecordedRequest {
        method: method.to_string(),
        url: url.clone(),
        body: body.clone(),
    });

    let (status, payload) = route(service, &method, &url, &body);
    let mut response = Response::from_string(payload).with_status_code(status);
    if let Ok(header) = Header::from_bytes("Content-Type", "application/json") {
        response.add_header(header);
    }
    if let Err(error) = request.respond(response) {
        tracing::warn!(%error, "mock server could not respond");
    }
}

fn route(service: &MemoryAccountService, method: &Method, url: &str, body: &str) -> (u16, String) {
    let record = url
        .strip_prefix(COLLECTION_PATH)
        .and_then(|rest| rest.strip_prefix('/'))
        .map(record_id);

    let result = match (method, url, record) {
        (Method::Get, COLLECTION_PATH, None) => service
            .list_accounts()
            .and_then(|accounts| Ok((200, serde_json::to_string(&accounts)?))),
        (Method::Post, COLLECTION_PATH, None) => parse_fields(body)
            .and_then(|fields| service.create_account(&fields))
            .and_then(|account| Ok((201, serde_json::to_string(&account)?))),
        (Method::Put, _, Some(id)) => parse_fields(body)
            .and_then(|fields| service.update_account(&id, &fields))
            .and_then(|account| Ok((200, serde_json::to_string(&account)?))),
        (Method::Delete, _, Some(id)) => service
            .delete_account(&id)
            .map(|()| (204, String::new())),
        _ => return (404, error_body(404, "Not Found", &format!("no route for {url}"))),
    };

    match result {
        Ok(response) => response,
        Err(error) => {
            let message = error.to_string();
            if message.contains("not found") {
                (404, error_body(404, "Not Found", &message))
            } else if message.starts_with("invalid body") {
                (400, error_body(400, "Bad Request", &message))
            } else {
                (500, error_body(500, "Internal Server Error", &message))
            }
        }
    }
}

// Path segments that read as integers address numeric ids; anything else is
// taken as a text id.
fn record_id(segment: &str) -> AccountId {
    segment
        .parse::<i64>()
        .map_or_else(|_| AccountId::text(segment), AccountId::new)
}

fn parse_fields(body: &str) -> Result<AccountFields> {
    serde_json::from_str(body).map_err(|error| anyhow!("invalid body: {error}"))
}

fn error_body(status: u16, error: &str, message: &str) -> String {
    serde_json::json!({
        "status": status,
        "error": error,
        "message": message,
    })
    .to_string()
}
