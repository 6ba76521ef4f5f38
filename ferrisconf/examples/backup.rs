//! Backup example: precheck and back up every host in an inventory file
//!
//! This example reads a JSON inventory, runs the connectivity precheck and
//! a sanitized configuration backup for every host over SSH, and prints a
//! per-host summary.
//!
//! # Inventory format
//!
//! ```json
//! [
//!   {"name": "core1", "hostname": "192.168.1.1", "platform": "cisco_ios",
//!    "username": "admin", "password": "secret"},
//!   {"name": "edge1", "hostname": "edge1.example.net", "platform": "juniper_junos",
//!    "username": "admin", "password": "secret", "port": 2222}
//! ]
//! ```
//!
//! # Rules format (optional)
//!
//! ```json
//! {
//!   "remove_lines": ["^Building configuration", "^ntp clock-period"],
//!   "substitute_lines": [
//!     {"regex_search": "^username \\S+ secret 5 (\\S+)", "regex_replacement": "<redacted>"}
//!   ]
//! }
//! ```
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --example backup -- --inventory hosts.json --rules rules.json --out backups
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use ferrisconf::transport::HostKeyVerification;
use ferrisconf::{Dispatcher, Host, SanitizationRules, SshConfig, SshTransport};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let hosts: Vec<Host> = serde_json::from_str(&std::fs::read_to_string(&args.inventory)?)?;
    let rules: SanitizationRules = match args.rules {
        Some(ref path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => SanitizationRules::new(),
    };

    let transport = SshTransport::new(SshConfig::default().host_key_verification(
        if args.insecure {
            HostKeyVerification::Disabled
        } else {
            HostKeyVerification::AcceptNew
        },
    ));

    let dispatcher = Dispatcher::builder().cli_transport(transport).build()?;

    println!("Backing up {} hosts to {}...", hosts.len(), args.out.display());

    let out = args.out.clone();
    let rules = Arc::new(rules);
    let report = dispatcher
        .run_batch(
            hosts.into_iter().map(Arc::new).collect(),
            args.workers,
            move |dispatcher, host| {
                let path = out.join(format!("{}.cfg", host.name));
                let rules = rules.clone();
                async move {
                    dispatcher.check_connectivity(&host).await?;
                    dispatcher.get_config(&host, &path, &rules).await
                }
            },
        )
        .await;

    println!("{}", "-".repeat(50));
    for outcome in &report.outcomes {
        match outcome.outcome {
            Ok(ref retrieved) => println!(
                "{:<20} ok     {} lines -> {}",
                outcome.host,
                retrieved.sanitized.lines().count(),
                retrieved.path.display()
            ),
            Err(ref e) => println!("{:<20} {:<6} {}", outcome.host, "FAILED", e.tag()),
        }
    }
    println!("{}", "-".repeat(50));
    println!(
        "{} succeeded, {} host failures, {} fatal",
        report.summary.succeeded, report.summary.host_failures, report.summary.fatal
    );

    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    inventory: PathBuf,
    rules: Option<PathBuf>,
    out: PathBuf,
    workers: usize,
    insecure: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut inventory = PathBuf::from("hosts.json");
        let mut rules = None;
        let mut out = PathBuf::from("backups");
        let mut workers = 10usize;
        let mut insecure = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--inventory" | "-i" => {
                    i += 1;
                    if i < args.len() {
                        inventory = PathBuf::from(&args[i]);
                    }
                }
                "--rules" | "-r" => {
                    i += 1;
                    if i < args.len() {
                        rules = Some(PathBuf::from(&args[i]));
                    }
                }
                "--out" | "-o" => {
                    i += 1;
                    if i < args.len() {
                        out = PathBuf::from(&args[i]);
                    }
                }
                "--workers" | "-w" => {
                    i += 1;
                    if i < args.len() {
                        workers = args[i].parse().unwrap_or(10);
                    }
                }
                "--insecure" => insecure = true,
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                }
            }
            i += 1;
        }

        Self {
            inventory,
            rules,
            out,
            workers,
            insecure,
        }
    }

    fn print_help() {
        println!(
            r#"ferrisconf backup example

USAGE:
    cargo run --example backup -- [OPTIONS]

OPTIONS:
    -i, --inventory <PATH>   JSON host inventory [default: hosts.json]
    -r, --rules <PATH>       JSON sanitization rules
    -o, --out <DIR>          Backup directory [default: backups]
    -w, --workers <N>        Hosts processed concurrently [default: 10]
    --insecure               Skip host key verification
    --help                   Print this help message
"#
        );
    }
}
