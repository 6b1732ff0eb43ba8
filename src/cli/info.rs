//! Configuration info command

use anyhow::Result;

use super::EngineArgs;

/// Print the resolved configuration as YAML
pub async fn info(engine: EngineArgs) -> Result<()> {
    let mut config = engine.load_config()?;
    if !config.server.api_key.is_empty() {
        config.server.api_key = "<redacted>".to_string();
    }

    println!("Scribe {}\n", env!("CARGO_PKG_VERSION"));
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}
