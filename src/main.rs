//! weather-sim - Emulated IoT sensors
//!
//! Usage:
//!   weather-sim serve --device http://localhost:8080/temperature/1 --device http://localhost:8080/humidity/1
//!   weather-sim weather --mq-server-url mqtt://localhost:1883 --mq-topic sensors/weather
//!   weather-sim stream --config sensors.json
//!   weather-sim simple

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;

use weather_sim::broker::QoS;
use weather_sim::config::{Config, PublishConfig};
use weather_sim::logging::{self, LogLevel};
use weather_sim::server::{self, http, shutdown_signal};

#[derive(Parser)]
#[command(name = "weather-sim")]
#[command(about = "Emulated temperature, humidity and weather sensors")]
struct Cli {
    /// Log verbosity
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve pull sensors over HTTP
    Serve {
        /// Device URL; repeat to add devices (e.g. http://host:8080/temperature/1)
        #[arg(short, long = "device", required = true)]
        devices: Vec<String>,

        /// Address to bind to
        #[arg(long, default_value = http::DEFAULT_ADDR)]
        addr: String,
    },

    /// Publish weather readings to an MQTT broker
    Weather {
        /// Broker URL (mqtt://host:port)
        #[arg(long = "mq-server-url")]
        server_url: String,

        /// Topic to publish readings on
        #[arg(long = "mq-topic")]
        topic: String,

        /// Delivery guarantee requested from the broker
        #[arg(long, value_enum, default_value_t = QoS::AtLeastOnce)]
        qos: QoS,
    },

    /// Push readings of every configured sensor onto in-process channels
    Stream {
        /// JSON config file; the built-in edge node is used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Run one sensor that only logs its readings
    Simple,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level);

    match cli.command {
        Commands::Serve { devices, addr } => {
            let listener = TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind {}", addr))?;
            http::serve(listener, &devices, shutdown_signal()).await?;
        }
        Commands::Weather {
            server_url,
            topic,
            qos,
        } => {
            let publish = PublishConfig {
                server_url,
                topic,
                qos,
            };
            server::weather::run(&publish, shutdown_signal())
                .await
                .context("weather simulator failed")?;
        }
        Commands::Stream { config } => {
            let config = match config {
                Some(path) => Config::load(&path)
                    .with_context(|| format!("failed to load {}", path.display()))?,
                None => Config::default(),
            };
            server::stream::run(&config, shutdown_signal()).await?;
        }
        Commands::Simple => {
            server::simple::run(shutdown_signal()).await?;
        }
    }

    info!("Done!");
    Ok(())
}
