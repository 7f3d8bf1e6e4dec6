//! `fastpush` command line entry point.

mod args;
mod config;

use std::process::ExitCode;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fastpush_client::{GatewaySession, WsPartTransport};
use fastpush_uploader::{BatchRunner, GatewayApi};

use crate::args::Args;
use crate::config::Config;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = args::resolve();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn run(args: Args) -> Result<()> {
    let config = Config::from_env(args.no_proxy)?;

    // Scan before dialing anything: an empty directory should not cost a
    // connection.
    let files = fastpush_catalog::scan(&config.download_dir, args.recursive, args.limit)?;
    if files.is_empty() {
        println!(
            "no video files found in {}",
            config.download_dir.display()
        );
        return Ok(());
    }

    println!(
        "uploading {} file(s) from {} to {}",
        files.len(),
        config.download_dir.display(),
        config.target
    );
    if let Some(proxy) = &config.gateway.proxy {
        info!(scheme = %proxy.scheme, host = %proxy.host, port = proxy.port, "using proxy");
    }

    let session = GatewaySession::connect(&config.gateway).await?;
    let transport = WsPartTransport::new(config.gateway.clone());

    let outcome = async {
        let target = session.resolve_target(&config.target).await?;
        let report = BatchRunner::new(&transport, &session)
            .connections(args.connections)
            .run(&target, &files)
            .await?;
        Ok::<_, anyhow::Error>(report)
    }
    .await;

    // The session is released whether the batch succeeded or not.
    let _ = session.close().await;

    let report = outcome?;
    info!(
        files = report.files,
        bytes = report.bytes,
        seconds = report.seconds,
        "batch finished"
    );
    Ok(())
}
