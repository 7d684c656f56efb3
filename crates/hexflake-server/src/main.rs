#![doc = include_str!("../README.md")]

mod server;

use anyhow::Context;
use clap::Parser;
use hexflake::{HexFlakeGenerator, SystemClock};
use server::config::{CliArgs, ServerConfig};
use server::machine_id::{InterfaceSource, SysfsInterfaces, resolve_machine_id};
use server::service::handler::{IdService, router};
use server::telemetry::init_telemetry;
use tokio::net::TcpListener;
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;

    // Exporters are flushed whether startup or serving fails.
    let result = run(&config).await;
    if let Err(err) = &result {
        tracing::error!("Service stopped with an error: {err:#}");
    }
    providers.shutdown();

    result
}

async fn run(config: &ServerConfig) -> anyhow::Result<()> {
    let (service, machine_id) = build_service(config, &SysfsInterfaces::default())?;

    let listener = TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server_addr))?;
    log_startup_info(config, machine_id);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shut down successfully");
    Ok(())
}

/// Resolves the machine ID and builds the generator behind the service.
fn build_service(
    config: &ServerConfig,
    interfaces: &impl InterfaceSource,
) -> anyhow::Result<(IdService<SystemClock>, u64)> {
    let machine_id = resolve_machine_id(&config.machine_id, interfaces)
        .context("failed to determine the machine ID")?;

    let generator = HexFlakeGenerator::new(machine_id, SystemClock::default());
    Ok((
        IdService::new(generator, config.max_ids_per_request),
        machine_id,
    ))
}

fn log_startup_info(config: &ServerConfig, machine_id: u64) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting ID service on {} with machine ID {:#x} and full config: {:#?}",
            config.server_addr,
            machine_id,
            config
        );
    } else {
        tracing::info!(
            "Starting ID service on {} with machine ID {:#x}",
            config.server_addr,
            machine_id
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(%err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use server::machine_id::{MachineIdSource, NetworkInterface};

    struct NoInterfaces;

    impl InterfaceSource for NoInterfaces {
        fn interfaces(&self) -> std::io::Result<Vec<NetworkInterface>> {
            Ok(Vec::new())
        }
    }

    fn config(machine_id: MachineIdSource) -> ServerConfig {
        ServerConfig {
            server_addr: "127.0.0.1:0".into(),
            max_ids_per_request: 10,
            machine_id,
        }
    }

    #[test]
    fn failed_discovery_is_an_error_not_a_panic() {
        let config = config(MachineIdSource::Discover { interface: None });
        // `IdService` is not `Debug`, so `unwrap_err` is unavailable.
        let err = build_service(&config, &NoInterfaces)
            .err()
            .expect("discovery without interfaces must fail");
        assert!(format!("{err:#}").contains("failed to determine the machine ID"));
    }

    #[test]
    fn fixed_machine_id_builds_a_service() {
        let config = config(MachineIdSource::Fixed(0x0242_ac11_0002));
        let (service, machine_id) = build_service(&config, &NoInterfaces).unwrap();
        assert_eq!(machine_id, 0x0242_ac11_0002);

        let body = service.generate(Some("2")).unwrap();
        assert_eq!(body.lines().count(), 2);
    }
}
