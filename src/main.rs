use imghost::config::{AppState, Config};
use imghost::render::{self, Templates};
use imghost::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;

    logger::init(&cfg.logging).map_err(|e| e as Box<dyn std::error::Error>)?;

    // Build the Tokio runtime, sized by the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    let templates = Templates::load(cfg.templates.dir.as_deref()).map_err(|e| {
        tracing::error!("Failed to load templates: {}", render::error_message(&e));
        e
    })?;

    let state = AppState::new(cfg, templates);
    state.store.ensure_root().await?;

    // Failing to bind is fatal
    let listener = server::create_listener(addr, state.config.server.backlog).map_err(|e| {
        tracing::error!("Failed to bind {addr}: {e}");
        e
    })?;

    logger::log_server_start(&listener.local_addr()?, &state.config);

    server::run(listener, state.shared(), server::signal::shutdown_signal()).await;
    Ok(())
}
