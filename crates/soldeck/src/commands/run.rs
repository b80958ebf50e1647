//! `soldeck run` -- the push daemon.

use tracing::info;

use soldeck_core::{Coordinator, OptionsHandle};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = crate::config::load(global)?;
    let connection = cfg.connection_config()?;
    let options = OptionsHandle::new(cfg.display_options());

    let coordinator = Coordinator::connect(&connection, options, cfg.sink_config()).await?;
    coordinator.start();
    info!("coordinator running, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    coordinator.shutdown().await;
    Ok(())
}
