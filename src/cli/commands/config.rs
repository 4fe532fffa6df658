//! Config Command
//!
//! Manage codescribe configuration.
//!
//! Usage:
//!   codescribe config show [--json]
//!   codescribe config path
//!   codescribe config init [-g] [--force]

use crate::cli::ui::Output;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show the merged effective configuration
pub fn show(json: bool) -> Result<()> {
    ConfigLoader::show_config(json)
}

/// Show configuration paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

/// Write a default config file
pub fn init(global: bool, force: bool) -> Result<()> {
    let existed = if global {
        ConfigLoader::global_config_path().is_some_and(|p| p.exists())
    } else {
        ConfigLoader::project_config_path().exists()
    };

    let path = ConfigLoader::init(global, force)?;
    let out = Output::new();
    if existed && !force {
        out.warning(&format!(
            "Config already exists: {} (use --force to overwrite)",
            path.display()
        ));
    } else {
        let scope = if global { "global" } else { "project" };
        out.success(&format!("Initialized {} configuration", scope));
        out.info(&format!("Config: {}", path.display()));
    }
    Ok(())
}
