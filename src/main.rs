use clap::Parser;
use color_eyre::Result;
use linkburst::{
    cli,
    config::Config,
    line, logging,
    session::{Options, Session},
};
use tracing::{debug, info, warn};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Resolves when the process is told to hang up.
#[cfg(unix)]
async fn hangup() -> std::io::Result<()> {
    let mut hangup = signal(SignalKind::hangup())?;
    hangup.recv().await;
    Ok(())
}

#[cfg(not(unix))]
async fn hangup() -> std::io::Result<()> {
    std::future::pending::<std::io::Result<()>>().await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    if let Some(command) = cli.command {
        cli::handle_command(command);

        return Ok(());
    }

    logging::init(cli.log_level()).await;

    let mut config = if let Some(config_path) = &cli.config {
        debug!(?config_path, "Config from path");
        Config::new_from_path(config_path)?
    } else {
        debug!("Default config");
        Config::default()
    };
    config.apply_cli(&cli);

    if !cli.transmit && !cli.receive {
        warn!("Neither transmit (-t) nor receive (-r) enabled, nothing to do");
        return Ok(());
    }

    let port = line::open(&config)?;

    let session = Session::new(Options {
        transmit: cli.transmit,
        receive: cli.receive,
        restart: config.restart,
        inject: cli.inject,
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C, quitting")
        }
        _ = hangup() => {
            info!("Told to hang up, quitting")
        }
        outcome = session.run(port) => {
            let summary = outcome?;
            info!(summary.sent, summary.received, "Session over");
        }
    }

    Ok(())
}
