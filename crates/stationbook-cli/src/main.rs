// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use runtime::{ServiceRuntime, SharedService};
use stationbook_app::{AccountService, AppCommand, AppState};
use stationbook_testkit::{AccountFaker, MemoryAccountService};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

const DEMO_SEED: u64 = 2026;
const DEMO_ACCOUNTS: usize = 24;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let mut config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `stationbook --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    if let Some(base_url) = &options.base_url {
        config.override_base_url(base_url)?;
    }

    let log_dir = logging::init(config.log_filter())?;

    let service: SharedService = if options.demo {
        tracing::info!(seed = DEMO_SEED, count = DEMO_ACCOUNTS, "using in-memory demo service");
        Arc::new(MemoryAccountService::with_accounts(
            AccountFaker::new(DEMO_SEED).accounts(DEMO_ACCOUNTS),
        ))
    } else {
        let client = stationbook_api::Client::new(config.base_url(), config.timeout()?)
            .with_context(|| {
                format!(
                    "invalid [api] config in {}; fix base_url/timeout values",
                    options.config_path.display()
                )
            })?;
        if options.check_only {
            let count = client.ping()?;
            println!(
                "ok: {} answered with {count} accounts (logs in {})",
                client.base_url(),
                log_dir.display()
            );
            return Ok(());
        }
        tracing::info!(base_url = client.base_url(), "using accounts service");
        Arc::new(client)
    };

    if options.check_only {
        let count = AccountService::list_accounts(service.as_ref())?.len();
        println!("ok: demo service seeded with {count} accounts");
        return Ok(());
    }

    let mut state = AppState::new(config.overlap_policy());
    if options.details.is_some() {
        state.dispatch(AppCommand::OpenDetails(options.details));
    }

    let mut runtime = ServiceRuntime::new(service);
    let result = stationbook_tui::run_app(&mut state, &mut runtime);
    tracing::info!(ok = result.is_ok(), "stationbook exiting");
    result
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    base_url: Option<String>,
    details: Option<String>,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        base_url: None,
        details: None,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--base-url" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("--base-url requires a URL such as http://localhost:8080")
                })?;
                options.base_url = Some(value.as_ref().to_owned());
            }
            "--details" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--details requires a text value"))?;
                options.details = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("stationbook: sites and service station accounts");
    println!("  --config <path>          Use a specific config path");
    println!("  --base-url <url>         Override [api].base_url");
    println!("  --details <text>         Start on the details screen with <text>");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Run against seeded in-memory accounts");
    println!("  --check                  Validate config and reach the accounts service");
    println!("  --help                   Show this help");
}
