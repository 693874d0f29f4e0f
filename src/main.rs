use anyhow::Context;
use clap::{Parser, Subcommand};
use pando::Config;
use pando_transport::Producer;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pando", version, about = "Log relay hub with channel subscriptions")]
struct Cli {
    /// Write debug logs to /tmp/pando-debug.log (tail -f to inspect).
    #[arg(long, global = true)]
    debug: bool,

    /// Config file. Defaults to $XDG_CONFIG_HOME/pando/config.toml if present.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the hub in the foreground (the default).
    Serve {
        /// UDP ingestion port.
        #[arg(long)]
        port: Option<u16>,
        /// TCP observer port.
        #[arg(long)]
        client_port: Option<u16>,
        /// Comma-separated seed subscriptions, e.g. `api:warn,worker`.
        #[arg(long)]
        seed: Option<String>,
        /// Add a concrete subscription for every channel a wildcard admits.
        #[arg(long)]
        auto_expand: bool,
        /// Disable colour on stdout.
        #[arg(long)]
        no_color: bool,
    },
    /// Send one event to a hub. Use `-` as the only fragment to stream stdin,
    /// one event per line.
    Send {
        /// Hub host.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Hub UDP port. Defaults to the configured ingestion port.
        #[arg(long)]
        port: Option<u16>,
        channel: String,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        what: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug)?;

    let mut config = Config::load(cli.config.as_deref()).context("cannot load configuration")?;

    match cli.command.unwrap_or(Command::Serve {
        port: None,
        client_port: None,
        seed: None,
        auto_expand: false,
        no_color: false,
    }) {
        Command::Serve { port, client_port, seed, auto_expand, no_color } => {
            if let Some(port) = port {
                config.ingest.bind.set_port(port);
            }
            if let Some(port) = client_port {
                config.observers.bind.set_port(port);
            }
            if let Some(seed) = seed {
                config.router.seed = seed;
            }
            config.router.auto_expand |= auto_expand;
            config.sink.color &= !no_color;
            pando::serve(config).await
        }
        Command::Send { host, port, channel, what } => {
            let port = port.unwrap_or_else(|| config.ingest.bind.port());
            let target = tokio::net::lookup_host((host.as_str(), port))
                .await
                .with_context(|| format!("cannot resolve {host}:{port}"))?
                .next()
                .with_context(|| format!("no address for {host}:{port}"))?;
            let producer = Producer::connect(target).await?;
            if what.len() == 1 && what[0] == "-" {
                let sent = producer.send_lines(&channel, tokio::io::stdin()).await?;
                tracing::debug!(sent, "stdin drained");
            } else {
                producer.send_text(&channel, what).await?;
            }
            Ok(())
        }
    }
}

fn init_tracing(debug: bool) -> anyhow::Result<()> {
    if debug {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("/tmp/pando-debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
        tracing::info!("pando debug log started, tail -f /tmp/pando-debug.log");
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .init();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn send_keeps_hyphenated_fragments() {
        let cli = Cli::try_parse_from(["pando", "send", "api:auth", "-", "--tail"]).unwrap();
        let Some(Command::Send { channel, what, port, .. }) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(channel, "api:auth");
        assert_eq!(what, vec!["-".to_string(), "--tail".to_string()]);
        assert_eq!(port, None);
    }

    #[test]
    fn serve_flags_parse_without_environment() {
        let cli = Cli::try_parse_from(["pando", "--debug", "serve", "--port", "9000", "--auto-expand"])
            .unwrap();
        assert!(cli.debug);
        let Some(Command::Serve { port, auto_expand, client_port, .. }) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(port, Some(9000));
        assert!(auto_expand);
        assert_eq!(client_port, None);
    }
}
