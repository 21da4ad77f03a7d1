//! Banyan RPC runtime - main entrypoint.
//!
//! Runs a built-in JSON-RPC service on the HTTP or request/reply transport,
//! drives the publish/subscribe line tools, and manages configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::AsyncBufReadExt;
use tracing::info;

use banyan_rpc_lib::config::{self, ConfigLoader, LogConfig};
use banyan_rpc_lib::protocol::jsonrpc::Service;
use banyan_rpc_lib::services;
use banyan_rpc_lib::transport::{self, Publisher, Uri};

/// Command line arguments for the Banyan RPC runtime.
#[derive(Parser, Debug)]
#[clap(name = "Banyan RPC", version, author, about)]
struct Args {
    /// Path to configuration file
    #[clap(short, long, value_parser)]
    config: Option<PathBuf>,

    /// Command to execute
    #[clap(subcommand)]
    command: Command,
}

/// A built-in service to expose on a transport.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum ServiceKind {
    /// Echo request params back for any method
    Echo,
    /// add/subtract/min/max
    Math,
    /// Key/value store with asynchronous get
    Keyval,
    /// Data-tree transactions over the in-memory store
    Data,
}

impl ServiceKind {
    fn build(self) -> Service {
        match self {
            ServiceKind::Echo => services::echo::service(),
            ServiceKind::Math => services::math::service(),
            ServiceKind::Keyval => services::keyval::service(),
            ServiceKind::Data => services::data(),
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Serve a built-in service over HTTP
    Http {
        /// The service to present
        #[clap(value_enum)]
        service: ServiceKind,

        /// URL path override (defaults to the configured path)
        #[clap(short, long)]
        path: Option<String>,
    },

    /// Serve a built-in service on a request/reply socket
    Rep {
        /// URI at which to bind the socket
        uri: String,

        /// The service to run on the socket
        #[clap(value_enum)]
        service: ServiceKind,
    },

    /// Publish each stdin line as a (topic, payload) message
    Publish {
        /// URI at which to bind the publish socket
        uri: String,

        /// Topic to publish on
        #[clap(short, long, default_value = "")]
        topic: String,
    },

    /// Print each (topic, payload) message received from a publisher
    Subscribe {
        /// URI of the publisher to connect to
        uri: String,

        /// Topic prefix to subscribe to
        #[clap(short, long, default_value = "")]
        topic: String,
    },

    /// Validate the configuration file
    Validate,

    /// Generate a default configuration file
    GenConfig {
        /// Path to output configuration file
        #[clap(short, long, value_parser)]
        output: PathBuf,
    },
}

/// Initialize the logging system.
fn init_logging(log: &LogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log.level.clone()));
    if log.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = <Args as clap::Parser>::parse();
    let loader = ConfigLoader::new(args.config.as_deref(), "BANYAN");

    match args.command {
        Command::Http { service, path } => {
            let cfg = load_or_exit(&loader);
            init_logging(&cfg.log);
            config::init_global_config(cfg.clone())?;
            let addr: SocketAddr = format!("{}:{}", cfg.server.bind, cfg.server.port)
                .parse()
                .context("bad bind address")?;
            let path = path.unwrap_or_else(|| cfg.server.path.clone());
            info!(%addr, path = %path, service = ?service, "starting HTTP transport");
            transport::http::serve(addr, [(path, Arc::new(service.build()))]).await?;
            Ok(())
        }
        Command::Rep { uri, service } => {
            let cfg = load_or_exit(&loader);
            init_logging(&cfg.log);
            config::init_global_config(cfg)?;
            let uri = Uri::parse(&uri)?;
            info!(uri = %uri, service = ?service, "starting request/reply transport");
            transport::rep::serve(&uri, Arc::new(service.build())).await?;
            Ok(())
        }
        Command::Publish { uri, topic } => {
            init_logging(&LogConfig::default());
            let uri = Uri::parse(&uri)?;
            let publisher = Arc::new(Publisher::new());
            let server = Arc::clone(&publisher);
            let bind = uri.clone();
            tokio::spawn(async move {
                if let Err(error) = server.serve(&bind).await {
                    tracing::error!(error = %error, "publisher stopped");
                }
            });
            let prefix = if topic.is_empty() {
                ">".to_string()
            } else {
                format!(">({topic})")
            };
            let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                let line = line.trim();
                if line.is_empty() {
                    break;
                }
                println!("{prefix} {line}");
                publisher.publish(&topic, line);
            }
            Ok(())
        }
        Command::Subscribe { uri, topic } => {
            init_logging(&LogConfig::default());
            let uri = Uri::parse(&uri)?;
            transport::pubsub::subscribe(&uri, &topic, |topic, payload| {
                if topic.is_empty() {
                    println!("< {payload}");
                } else {
                    println!("<({topic}) {payload}");
                }
            })
            .await?;
            Ok(())
        }
        Command::Validate => {
            init_logging(&LogConfig::default());
            info!("Validating configuration");
            match loader.load() {
                Ok(_) => {
                    info!("Configuration validated successfully");
                    Ok(())
                }
                Err(error) => {
                    tracing::error!("Configuration validation error: {}", error);
                    process::exit(1);
                }
            }
        }
        Command::GenConfig { output } => {
            init_logging(&LogConfig::default());
            info!("Generating default configuration");
            let default_config = config::BanyanConfig::default();

            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let toml =
                toml::to_string_pretty(&default_config).context("failed to serialize config")?;
            std::fs::write(&output, toml)?;

            info!("Default configuration written to {:?}", output);
            Ok(())
        }
    }
}

fn load_or_exit(loader: &ConfigLoader) -> config::BanyanConfig {
    match loader.load() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Configuration error: {error}");
            process::exit(1);
        }
    }
}
