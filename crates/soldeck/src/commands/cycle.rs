//! `soldeck cycle` -- one update cycle, raw payload to stdout.
//!
//! The printed payload preserves nulls for unbound/unavailable sources,
//! which makes this the quickest way to check a mapping before leaving
//! the daemon running.

use chrono::Utc;

use soldeck_core::{Coordinator, OptionsHandle};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = crate::config::load(global)?;
    let connection = cfg.connection_config()?;
    let options = OptionsHandle::new(cfg.display_options());

    let coordinator = Coordinator::connect(&connection, options, cfg.sink_config()).await?;
    let payload = coordinator.run_cycle(Utc::now()).await;

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
