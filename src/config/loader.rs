use std::fs;
use std::path::PathBuf;

use crate::config::AppConfig;

const CONFIG_DIR: &str = "polex";
const CONFIG_FILE: &str = "config.toml";

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(CONFIG_DIR))
}

pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

pub fn load() -> color_eyre::Result<AppConfig> {
    let Some(path) = config_path() else {
        tracing::debug!("No config directory found, using defaults");
        return Ok(AppConfig::default());
    };

    if !path.exists() {
        tracing::debug!("Config file not found at {path:?}, using defaults");
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(&path)?;
    let config: AppConfig = toml::from_str(&content)?;
    tracing::debug!("Loaded config from {path:?}");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use crate::config::AppConfig;

    #[test]
    fn parses_full_config() {
        let toml = r#"
            [server]
            base_url = "http://ranger.example:6080/"
            username = "admin"
            password = "secret"

            [export]
            output_dir = "/tmp/exports"

            [theme]
            name = "Catppuccin Latte"

            [keybindings.global]
            quit = "ctrl+q"
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.base_url, "http://ranger.example:6080/");
        assert_eq!(config.server.username.as_deref(), Some("admin"));
        assert_eq!(
            config.export.output_dir.as_deref(),
            Some(std::path::Path::new("/tmp/exports"))
        );
        assert_eq!(config.theme.name, "Catppuccin Latte");
    }

    #[test]
    fn empty_config_falls_back_to_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.base_url, "http://localhost:6080");
        assert!(config.server.username.is_none());
    }
}
