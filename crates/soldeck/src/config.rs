//! Config loading with CLI flag overrides.

use std::path::PathBuf;

use soldeck_config::Config;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The config file path: `--config` / `SOLDECK_CONFIG` override, else the
/// platform default.
pub fn resolved_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(soldeck_config::config_path)
}

/// Load the config file and apply CLI flag overrides on top.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = soldeck_config::load_config_from(&resolved_path(global))?;

    if let Some(ref url) = global.url {
        cfg.connection.url = url.clone();
    }
    if let Some(ref token) = global.token {
        cfg.connection.token = Some(token.clone());
    }
    if global.insecure {
        cfg.connection.insecure = true;
    }

    Ok(cfg)
}
