//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "finsense";
const PROJECT_FILES: [&str; 2] = ["finsense.toml", ".finsense.toml"];
const ENV_PREFIX: &str = "FINSENSE_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `FINSENSE_*` environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./finsense.toml` or `./.finsense.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/finsense/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        let mut figment = Self::base();

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(path));
        }

        Self::finish(figment, config_path.map(PathBuf::as_path))
    }

    /// Load from one explicit file on top of defaults, skipping discovery.
    pub fn load_file(path: &Path) -> Result<FileConfig, Box<figment::Error>> {
        Self::finish(Self::base(), Some(path))
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    fn base() -> Figment {
        Figment::new().merge(Serialized::defaults(FileConfig::default()))
    }

    fn finish(mut figment: Figment, explicit: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)
    }

    /// Get the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources() {
        println!("Configuration sources (in priority order):");
        println!("  [ENV  ] Environment: {}*", ENV_PREFIX);

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./finsense.toml or ./.finsense.toml");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.servers.len(), 3);
        assert_eq!(config.cache.default_ttl_secs, 300);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("finsense"));
    }

    #[test]
    fn test_explicit_file_and_env_override() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
                [conversation]
                context_window = 10
                default_timeframe = "1 week"
                "#,
            )?;
            jail.set_env("FINSENSE_CONVERSATION__CONTEXT_WINDOW", "3");

            let config = ConfigLoader::load_file(Path::new("custom.toml")).map_err(|e| *e)?;
            assert_eq!(config.conversation.context_window, 3);
            assert_eq!(config.conversation.default_timeframe, "1 week");
            assert_eq!(config.servers.len(), 3);
            Ok(())
        });
    }
}
