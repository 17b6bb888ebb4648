use clap::Parser;
use pagewise::{CollectionStore, StateService};
use pagewise_server::{AppState, ServerArgs, app};
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pagewise=info,pagewise_server=info,tower_http=info")),
        )
        .init();

    let args = ServerArgs::parse();
    let service = StateService::new(CollectionStore::with_len(args.items))
        .with_max_page_size(args.max_page_size.get());
    let router = app(AppState::new(service, args.default_page_size.get()));

    let listener = TcpListener::bind(args.socket_addr()).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        items = args.items,
        default_page_size = args.default_page_size.get(),
        max_page_size = args.max_page_size.get(),
        "pagewise server listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
