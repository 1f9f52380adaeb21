use log::{error, info};
use notepad_core::{core_version, init_logging};
use notepad_web::{create_router, AppState, ServerConfig};
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = ServerConfig::from_env()?;
    if let Err(err) = init_logging(&config.log_level, &config.log_dir.to_string_lossy()) {
        eprintln!("logging disabled: {err}");
    }

    let state = AppState::open(&config).map_err(|err| {
        error!("event=server_start module=web status=error error={err}");
        err
    })?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(
        "event=server_start module=web status=ok addr={} version={}",
        config.bind_addr,
        core_version()
    );
    axum::serve(listener, app).await?;
    Ok(())
}
