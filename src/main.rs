//! `oic-resource` command-line host.
//!
//! ```bash
//! # Host the sample resources, observe the light for 5 notifications
//! oic-resource serve --ticks 5
//!
//! # Host until Ctrl+C
//! oic-resource --config host.toml serve
//!
//! # Provisioning chain against a simulated network
//! oic-resource provision --devices 3 --latency-ms 50
//!
//! # Configuration files
//! oic-resource gen-config --output host.toml
//! oic-resource validate --config host.toml
//! ```

use clap::{Parser, Subcommand};
use oic_resource::clients::{DiscoveryTask, RemoteResource};
use oic_resource::config::HostConfig;
use oic_resource::lifecycle::{setup_tracing, ServerSystem};
use oic_resource::model::Representation;
use oic_resource::provisioning::{ProvisioningClient, SimulatedNetwork};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Instrument};

#[derive(Parser, Debug)]
#[command(name = "oic-resource")]
#[command(about = "OIC resource host on resource actors")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Host the sample resources
    Serve {
        /// Stop after this many light notifications (0 runs until Ctrl+C)
        #[arg(long, default_value = "0")]
        ticks: u64,
    },

    /// Run the provisioning chain against a simulated network
    Provision {
        /// Number of unowned devices on the network
        #[arg(long, default_value = "2")]
        devices: usize,

        /// Simulated delay of every device call, in milliseconds
        #[arg(long, default_value = "0")]
        latency_ms: u64,
    },

    /// Write the default configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "oic-resource.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_tracing(&args.log_level);

    match args.command {
        Commands::GenConfig { output } => cmd_gen_config(output),
        Commands::Validate { config } => cmd_validate(config),
        Commands::Serve { ticks } => cmd_serve(load_config(args.config)?, ticks).await,
        Commands::Provision { devices, latency_ms } => {
            cmd_provision(load_config(args.config)?, devices, Duration::from_millis(latency_ms)).await
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<HostConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            Ok(HostConfig::from_file(path)?)
        }
        None => Ok(HostConfig::default()),
    }
}

fn cmd_gen_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(&output, HostConfig::default().to_toml_string()?)?;
    println!("Generated configuration: {}", output.display());
    Ok(())
}

fn cmd_validate(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = HostConfig::from_file(&path)?;
    println!("Configuration valid: {}", path.display());
    println!("  notify interval: {} ms ({:?})", config.server.notify_interval_ms, config.server.notify_mode);
    println!("  request timeout: {} ms", config.platform.request_timeout_ms);
    println!("  discovery interval: {} ms", config.client.discovery_interval_ms);
    println!("  readiness timeout: {} ms", config.provisioning.readiness_timeout_ms);
    Ok(())
}

async fn cmd_serve(config: HostConfig, ticks: u64) -> Result<(), Box<dyn std::error::Error>> {
    let system = ServerSystem::start(&config)?;
    let transport = system.transport();

    for descriptor in transport.find_resources(None).await {
        println!("{:<20} {:<20} {}", descriptor.uri, descriptor.resource_type, descriptor.interface);
    }

    let (discovery, mut found) = DiscoveryTask::start(transport, Some("core.light".to_string()), &config.client);
    let light = tokio::time::timeout(Duration::from_secs(5), found.recv()).await;
    discovery.cancel();
    let light: RemoteResource = match light {
        Ok(Some(light)) => light,
        _ => {
            warn!("No light discovered");
            system.shutdown().await?;
            return Ok(());
        }
    };

    let span = tracing::info_span!("light_session", uri = light.uri());
    async {
        println!("GET {} -> {}", light.uri(), light.get().await?);
        let updated = light.put(Representation::new().with("state", true)).await?;
        println!("PUT {} -> {}", light.uri(), updated);

        let mut subscription = light.observe().await?;
        println!("OBSERVE {} -> {}", light.uri(), subscription.initial().representation);

        if ticks == 0 {
            println!("Press Ctrl+C to stop...");
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    notification = subscription.next() => match notification {
                        Some(n) => println!("#{} {}", n.sequence, n.representation),
                        None => break,
                    },
                }
            }
        } else {
            for _ in 0..ticks {
                match subscription.next().await {
                    Some(n) => println!("#{} {}", n.sequence, n.representation),
                    None => break,
                }
            }
        }
        subscription.cancel().await?;
        Ok::<_, Box<dyn std::error::Error>>(())
    }
    .instrument(span)
    .await?;

    let reported = discovery.join().await;
    info!(reported, "Discovery finished");
    system.shutdown().await?;
    Ok(())
}

async fn cmd_provision(
    config: HostConfig,
    devices: usize,
    latency: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let network = Arc::new(SimulatedNetwork::with_unowned(devices).with_latency(latency));
    let mut client = ProvisioningClient::new(network, config.provisioning);

    match client.run().await {
        Ok(report) => {
            println!("Provisioning complete");
            println!("  onboarded: {:?}", report.onboarded);
            println!("  owned:     {:?}", report.owned);
            println!("  linked:    {:?}", report.linked);
            for stage in &report.skipped {
                println!("  skipped:   {}", stage);
            }
            Ok(())
        }
        Err(e) => {
            println!("Provisioning halted at {}: {}", client.stage(), e);
            let passed: Vec<String> = client.history().iter().map(ToString::to_string).collect();
            println!("  stages entered: {}", passed.join(" -> "));
            Err(e.into())
        }
    }
}
