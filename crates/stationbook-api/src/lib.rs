// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use serde::Deserialize;
use stationbook_app::{Account, AccountFields, AccountId, AccountService};
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const ACCOUNTS_PATH: &str = "api/accounts";

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    /// Origin the client talks to, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn collection_url(&self) -> Result<Url> {
        self.base_url
            .join(ACCOUNTS_PATH)
            .with_context(|| format!("build accounts URL from {}", self.base_url()))
    }

    /// The id goes into the path as one percent-encoded segment.
    pub fn record_url(&self, id: &AccountId) -> Result<Url> {
        let mut url = self.collection_url()?;
        url.path_segments_mut()
            .map_err(|()| anyhow!("build account {id} URL from {}", self.base_url()))?
            .push(&id.to_string());
        Ok(url)
    }

    /// Issues one list request; used by `--check` to prove the service answers.
    pub fn ping(&self) -> Result<usize> {
        Ok(self.list_accounts()?.len())
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        Ok(response)
    }
}

impl AccountService for Client {
    fn list_accounts(&self) -> Result<Vec<Account>> {
        let url = self.collection_url()?;
        tracing::debug!(%url, "GET accounts");
        let response = self.send(self.http.get(url))?;
        response.json().context("decode account list")
    }

    fn create_account(&self, fields: &AccountFields) -> Result<Account> {
        let url = self.collection_url()?;
        tracing::debug!(%url, "POST account");
        let response = self.send(self.http.post(url).json(fields))?;
        response.json().context("decode created account")
    }

    fn update_account(&self, id: &AccountId, fields: &AccountFields) -> Result<Account> {
        let url = self.record_url(id)?;
        tracing::debug!(%url, "PUT account");
        let response = self.send(self.http.put(url).json(fields))?;
        response.json().context("decode updated account")
    }

    fn delete_account(&self, id: &AccountId) -> Result<()> {
        let url = self.record_url(id)?;
        tracing::debug!(%url, "DELETE account");
        self.send(self.http.delete(url))?;
        Ok(())
    }
}

/// Accepts an absolute http(s) origin, optionally with a path prefix. The
/// returned URL always ends in `/` so endpoint paths join beneath it.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        bail!("api.base_url must not be empty");
    }
    let url = Url::parse(&format!("{trimmed}/"))
        .with_context(|| format!("api.base_url {raw:?} is not a valid URL"))?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => bail!("api.base_url {raw:?} uses unsupported scheme {scheme:?}; use http or https"),
    }
    if url.host_str().is_none() {
        bail!("api.base_url {raw:?} has no host");
    }
    Ok(url)
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- check that the accounts service is running ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body) {
        if let Some(message) = parsed.message
            && !message.is_empty()
        {
            return anyhow!("server error ({}): {}", status.as_u16(), message);
        }
        if let Some(error) = parsed.error
            && !error.is_empty()
        {
            return anyhow!("server error ({}): {}", status.as_u16(), error);
        }
    }

    let body = body.trim();
    if !body.is_empty() && body.len() < 100 && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
    error: Option<String>,
}
