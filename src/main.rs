use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use blobserve::config::{AppState, Config};
use blobserve::logger;
use blobserve::server::{self, SignalHandler};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cfg = Config::load()?;
    logger::init(&cfg)?;

    // Size the runtime from the workers setting, default is one per core
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;
    let state = Arc::new(AppState::new(&cfg)?);

    let signals = Arc::new(SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals))?;

    logger::log_server_start(&addr, &cfg);

    server::start_server_loop(
        listener,
        state,
        Arc::new(AtomicUsize::new(0)),
        signals,
    )
    .await
}
