//! QL-Admin: Quantum-Lock admin client

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use ql_admin::AdminClient;

/// QL-Admin: Quantum-Lock admin client
#[derive(Parser, Debug)]
#[command(name = "ql-admin")]
#[command(about = "Inspect a running Quantum-Lock server")]
struct Args {
    /// Lock server address
    #[arg(short, long, default_value = "127.0.0.1:11400")]
    addr: SocketAddr,

    /// Seconds to wait for each reply
    #[arg(short, long, default_value = "5")]
    timeout: u64,

    #[command(subcommand)]
    command: AdminCommand,
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    /// Connection and lock counters
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
        /// Repeat every N seconds until interrupted
        #[arg(long)]
        watch: Option<u64>,
    },
    /// Every lock with its owners and waiters
    Debug,
    /// Send raw command lines on one connection, in order
    Send {
        #[arg(required = true)]
        lines: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut client = AdminClient::connect(args.addr, Duration::from_secs(args.timeout))
        .await
        .with_context(|| format!("Failed to connect to {}", args.addr))?;

    match args.command {
        AdminCommand::Stats { json, watch } => {
            let Some(secs) = watch else {
                return print_stats(&mut client, json).await;
            };
            if secs == 0 {
                bail!("--watch interval must be at least 1 second");
            }
            let mut interval = tokio::time::interval(Duration::from_secs(secs));
            loop {
                interval.tick().await;
                print_stats(&mut client, json).await?;
            }
        }
        AdminCommand::Debug => {
            for line in client.debug().await? {
                println!("{line}");
            }
        }
        AdminCommand::Send { lines } => {
            for line in lines {
                let reply = client.send(&line).await?;
                println!("{} {}", reply.status.code, reply.status.message);
                for body in reply.body {
                    println!("{body}");
                }
            }
        }
    }

    Ok(())
}

async fn print_stats(client: &mut AdminClient, json: bool) -> Result<()> {
    let stats = client.stats().await?;
    if json {
        println!("{}", serde_json::to_string(&stats)?);
    } else {
        println!(
            "clients: {}  locks: {}  monitoring: {}",
            stats.clients, stats.locks, stats.monitoring
        );
    }
    Ok(())
}
