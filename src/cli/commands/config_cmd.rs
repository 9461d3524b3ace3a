//! The `config` command.

use anyhow::Context;

use docintake::Config;

use crate::cli::icons::dim_arrow;

/// Print the effective configuration.
pub fn cmd_config_show(config: &Config) -> anyhow::Result<()> {
    match &config.source_path {
        Some(path) => eprintln!("{} Loaded from {}", dim_arrow(), path.display()),
        None => eprintln!("{} No config file found, showing defaults", dim_arrow()),
    }

    let rendered = config.to_toml().context("Failed to render configuration")?;
    print!("{}", rendered);
    Ok(())
}
