// Reading the orchestra configuration from disk. The file is never written
// back; `--print-config` dumps the built-in seating as a starting point.
use std::path::Path;

use anyhow::Context;

use super::config::OrchestraConfig;

/// `None` gives the built-in orchestra.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<OrchestraConfig> {
    let Some(path) = path else {
        return Ok(OrchestraConfig::default());
    };
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = serde_json::from_str(&data)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

pub fn config_json(config: &OrchestraConfig) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_path_gives_built_in_orchestra() {
        assert_eq!(load_config(None).unwrap(), OrchestraConfig::default());
    }

    #[test]
    fn printed_config_loads_back() {
        let dir = std::env::temp_dir().join(format!("orchestty_cfg_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("orchestra.json");

        let mut config = OrchestraConfig::default();
        config.master_volume = 0.9;
        std::fs::write(&path, config_json(&config).unwrap()).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), config);

        std::fs::write(&path, "{ nope").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Some(Path::new("/no/such/orchestra.json"))).is_err());
    }
}
