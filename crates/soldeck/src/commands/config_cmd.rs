//! `soldeck config` -- show, init, and locate the config file.

use soldeck_config::Config;

use crate::cli::{ConfigCommand, GlobalOpts};
use crate::error::CliError;

pub fn handle(cmd: ConfigCommand, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        ConfigCommand::Show => show(global),
        ConfigCommand::Init { force } => init(global, force),
        ConfigCommand::Path => {
            println!("{}", crate::config::resolved_path(global).display());
            Ok(())
        }
    }
}

fn show(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = crate::config::load(global)?;
    // Never echo a plaintext token back out.
    if cfg.connection.token.is_some() {
        cfg.connection.token = Some("<redacted>".into());
    }
    print!("{}", toml::to_string_pretty(&cfg)?);
    Ok(())
}

fn init(global: &GlobalOpts, force: bool) -> Result<(), CliError> {
    let path = crate::config::resolved_path(global);
    if path.exists() && !force {
        return Err(CliError::ConfigExists {
            path: path.display().to_string(),
        });
    }

    soldeck_config::save_config_to(&Config::default(), &path)?;
    println!("wrote {}", path.display());
    Ok(())
}
