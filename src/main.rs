use clap::Parser;
use std::sync::Arc;
use stockbook::Config;
use stockbook::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    let service = config.service_builder().open()?;
    log::info!(
        "stockbook: inventory {}, ledger {}, audit log {}",
        service.store().path().display(),
        service.ledger().path().display(),
        service.audit_log().path().display()
    );

    let app = server::router(AppState {
        service: Arc::new(service),
        port: config.port,
    });

    let listener = tokio::net::TcpListener::bind(config.addr()).await?;
    log::info!("stockbook: server running at http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("stockbook: shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("stockbook: failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
