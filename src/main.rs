//!
//! barangay-access binary
//! ----------------------
//! Inspect access decisions against the durable storage a dashboard would use:
//! restore the session, then resolve paths or print the visible menu. `login`
//! and `logout` write the storage the way the login flow does.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use barangay_access::identity::{Credential, Identity};
use barangay_access::routing::GuardPolicy;
use barangay_access::{AccessApp, AccessConfig, AppError};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--storage <file>] [--enforce-roles] resolve <path>...\n  {program} [--storage <file>] menu\n  {program} [--storage <file>] whoami\n  {program} [--storage <file>] login --token <token> --identity <json>\n  {program} [--storage <file>] logout\n\nFlags:\n  --storage <file>   storage file (overrides BARANGAY_STORAGE; ':memory:' for none)\n  --enforce-roles    deny protected paths whose menu entry excludes the role\n  (flags may appear before or after the command)\n  -h, --help         show this help\n\nEnvironment:\n  BARANGAY_CONFIG, BARANGAY_STORAGE, BARANGAY_TOKEN_KEY, BARANGAY_IDENTITY_KEY, BARANGAY_ENFORCE_ROLES\n  RUST_LOG (default: info)"
    );
}

fn take_value(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

struct Cli {
    storage: Option<String>,
    enforce_roles: bool,
    command: String,
    rest: Vec<String>,
}

// Options taking a value that belong to a command rather than to the tool.
const COMMAND_OPTIONS: &[&str] = &["--token", "--identity"];

/// Global flags are accepted anywhere on the line; anything else starting with
/// `--` must be a known command option.
fn parse_args(args: &[String]) -> Result<Cli> {
    let mut storage = None;
    let mut enforce_roles = false;
    let mut positional: Vec<String> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let a = args[i].as_str();
        match a {
            "--storage" => {
                storage = Some(args.get(i + 1).cloned().ok_or_else(|| anyhow!("--storage needs a value"))?);
                i += 2;
            }
            "--enforce-roles" => {
                enforce_roles = true;
                i += 1;
            }
            _ if COMMAND_OPTIONS.contains(&a) => {
                let v = args.get(i + 1).cloned().ok_or_else(|| anyhow!("{} needs a value", a))?;
                positional.push(a.to_string());
                positional.push(v);
                i += 2;
            }
            _ if a.starts_with("--") => return Err(anyhow!("unknown option '{}'", a)),
            _ => {
                positional.push(a.to_string());
                i += 1;
            }
        }
    }
    if positional.is_empty() {
        return Err(anyhow!("missing command"));
    }
    let command = positional.remove(0);
    Ok(Cli { storage, enforce_roles, command, rest: positional })
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = AccessConfig::from_env()?;
    if let Some(s) = cli.storage.as_deref() {
        config.storage_path = if s == ":memory:" { None } else { Some(PathBuf::from(s)) };
    }
    if cli.enforce_roles {
        config.guard_policy = GuardPolicy::EnforceRoles;
    }
    info!(
        target: "startup",
        "barangay-access: storage={:?}, token_key='{}', identity_key='{}', policy={:?}",
        config.storage_path, config.keys.token, config.keys.identity, config.guard_policy
    );

    let app = AccessApp::new(config)?;

    match cli.command.as_str() {
        "login" => {
            let token = take_value(&cli.rest, "--token").ok_or_else(|| anyhow!("login needs --token"))?;
            let raw = take_value(&cli.rest, "--identity").ok_or_else(|| anyhow!("login needs --identity"))?;
            let identity: Identity = serde_json::from_str(&raw).map_err(AppError::from).context("invalid --identity")?;
            app.persister().persist_login(&identity, &Credential::new(token))?;
            println!("{}", json!({ "stored": true, "user": identity.id, "role": identity.role }));
            return Ok(());
        }
        "logout" => {
            app.persister().persist_logout()?;
            println!("{}", json!({ "stored": false }));
            return Ok(());
        }
        _ => {}
    }

    if let Some(handle) = app.mount() {
        let outcome = handle.await.context("restore task failed")?;
        info!(target: "startup", "restore finished: {:?}", outcome);
    }

    match cli.command.as_str() {
        "resolve" => {
            if cli.rest.is_empty() {
                return Err(anyhow!("resolve needs at least one path"));
            }
            for path in &cli.rest {
                let settled = app.settle(path)?;
                println!("{}", serde_json::to_string(&settled)?);
            }
        }
        "menu" => {
            println!("{}", serde_json::to_string_pretty(&app.menu())?);
        }
        "whoami" => {
            let state = app.state();
            let out = json!({
                "authenticated": state.is_authenticated(),
                "loading": state.loading,
                "display_name": state.identity.as_ref().map(|i| i.display_name()),
                "identity": state.identity,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        other => return Err(anyhow!("unknown command '{}'", other)),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| "barangay-access".to_string());
    if args.iter().skip(1).any(|a| a == "-h" || a == "--help") {
        print_usage(&program);
        return;
    }
    let cli = match parse_args(&args[1.min(args.len())..]) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            print_usage(&program);
            std::process::exit(2);
        }
    };
    if let Err(e) = run(cli).await {
        eprintln!("error: {:#}", e);
        let code = e.downcast_ref::<AppError>().map(|a| a.exit_code()).unwrap_or(1);
        std::process::exit(code);
    }
}
