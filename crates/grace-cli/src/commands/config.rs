use anyhow::{Context, Result};
use grace_infrastructure::ConfigService;

pub fn show(service: &ConfigService) -> Result<()> {
    let config = service.get_config().context("Failed to load configuration")?;
    let mut rendered = config.clone();
    if !rendered.backend.api_key.is_empty() {
        rendered.backend.api_key = "<redacted>".to_string();
    }
    let toml = rendered
        .to_toml_string()
        .context("Failed to render configuration")?;
    println!("# {}", service.path().display());
    print!("{}", toml);
    Ok(())
}

pub fn path(service: &ConfigService) -> Result<()> {
    println!("{}", service.path().display());
    Ok(())
}
