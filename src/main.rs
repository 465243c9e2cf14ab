use fundledger::api;
use fundledger::domain::ChainId;
use fundledger::{
    init_db, Config, HttpEventSource, Processor, Repository, RpcAccessor,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));
    let chain_id = ChainId::new(config.chain_id.clone());

    let accessor = Arc::new(RpcAccessor::new(config.rpc_url.clone()));
    let source = Arc::new(HttpEventSource::new(
        config.events_url.clone(),
        config.chain_id.clone(),
    ));
    let processor = Processor::new(source, accessor, repo.clone(), chain_id.clone());
    let poll_interval = Duration::from_millis(config.poll_interval_ms);
    tokio::spawn(async move {
        processor.run(poll_interval).await;
    });

    let app = api::create_router(api::AppState { repo, chain_id });

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
