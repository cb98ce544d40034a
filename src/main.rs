use std::sync::Arc;

use coi_server::handler::{CrossOriginIsolation, StaticFiles};
use coi_server::server::{self, Server, Shutdown};
use coi_server::{logger, Config};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional config file path as the first argument
    let cfg = match std::env::args().nth(1) {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };
    logger::init(&cfg)?;

    // Create Tokio runtime, sized by the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let files = StaticFiles::from_config(&cfg).inspect_err(|e| {
        logger::log_error(&format!(
            "Cannot serve '{}': {e}",
            cfg.server.root.display()
        ));
    })?;
    let root = files.root().to_path_buf();

    let server = Server::bind(&cfg, CrossOriginIsolation::new(files))?;
    logger::log_server_start(&server.local_addr(), &root, &cfg);

    let shutdown = Arc::new(Shutdown::new());
    server::spawn_signal_listener(Arc::clone(&shutdown))?;

    server.run(shutdown).await;
    logger::log_info("Server stopped");
    Ok(())
}
