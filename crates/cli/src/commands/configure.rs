//! Persistent CLI settings

use anyhow::{bail, Result};

use crate::config::Config;
use crate::output::{print_info, print_json, print_success, OutputFormat};

/// Show the stored configuration
pub fn show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(config)?,
        OutputFormat::Table => {
            print_info(&format!("Config file: {}", Config::config_path()?.display()));
            println!(
                "api_url:          {}",
                config.api_url.as_deref().unwrap_or("(unset)")
            );
            println!(
                "default_format:   {}",
                config.default_format.as_deref().unwrap_or("(unset)")
            );
        }
    }
    Ok(())
}

/// Update and save the stored configuration
pub fn set(mut config: Config, api_url: Option<String>, format: Option<String>) -> Result<()> {
    if api_url.is_none() && format.is_none() {
        bail!("Nothing to set, pass --api-url or --default-format");
    }

    if let Some(url) = api_url {
        url::Url::parse(&url)?;
        config.api_url = Some(url);
    }
    if let Some(name) = format {
        if OutputFormat::from_name(&name).is_none() {
            bail!("Unknown output format: {}", name);
        }
        config.default_format = Some(name.to_lowercase());
    }

    let path = config.save()?;
    print_success(&format!("Saved {}", path.display()));
    Ok(())
}
