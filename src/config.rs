//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. User config: `~/.config/arbre/config.toml` (XDG) or platform config dir
//! 2. Project config: `.arbre.toml`
//! 3. Environment variables: `ARBRE_*`, nested keys split on `__`
//!    (`ARBRE_LAYOUT__NODE_WIDTH=180`)
//!
//! # Example
//!
//! ```toml
//! [layout]
//! node_width = 180
//! h_gap = 40
//!
//! [tree]
//! depth = 5
//!
//! [api]
//! base_url = "https://genealogia.example.org"
//! profile_base = "/persones"
//! ```
//!
//! Every key has a default, so an empty or missing file is valid.

use std::ops::Deref;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Project config file name, looked up in the working directory.
pub const PROJECT_CONFIG: &str = ".arbre.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "ARBRE_";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub tree: TreeConfig,
    pub api: ApiConfig,
}

/// Box geometry and spacing, in abstract drawing units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    /// Gap between the two boxes of a couple.
    pub spouse_gap: f64,
    /// Minimum gap between neighbouring clusters in a row.
    pub h_gap: f64,
    /// Gap between rows.
    pub v_gap: f64,
    /// Marriage line offset below the lowest parent bottom.
    pub marriage_drop: f64,
    /// Bus line offset above the highest child top.
    pub bus_rise: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 160.0,
            node_height: 56.0,
            spouse_gap: 24.0,
            h_gap: 32.0,
            v_gap: 72.0,
            marriage_drop: 10.0,
            bus_rise: 28.0,
        }
    }
}

/// Tree view defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Generations shown along the ancestor trunk, focus included.
    pub depth: usize,
    /// Generations requested by the `expand` command.
    pub expand_gens: u32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            depth: 4,
            expand_gens: 2,
        }
    }
}

/// Expand API access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Site root; the expand endpoint is resolved against it.
    pub base_url: String,
    pub timeout_secs: u64,
    /// Disables lazy ancestor fetches.
    pub disable_expand: bool,
    /// Prefix for profile links; empty disables them.
    pub profile_base: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 10,
            disable_expand: false,
            profile_base: String::new(),
        }
    }
}

impl Config {
    /// Load config with layered resolution (defaults → user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// The provider stack behind [`Config::load`].
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(Self::user_config_path()))
            .merge(Toml::file(PROJECT_CONFIG))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// User config path: ~/.config/arbre/config.toml (XDG) or platform config dir.
    pub fn user_config_path() -> PathBuf {
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("arbre").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        dirs::config_dir()
            .map(|p| p.join("arbre").join("config.toml"))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_files() {
        Jail::expect_with(|_jail| {
            let config = Config::load().map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            assert_eq!(config.layout.node_width, 160.0);
            assert_eq!(config.tree.depth, 4);
            Ok(())
        });
    }

    #[test]
    fn test_project_file_and_env_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                PROJECT_CONFIG,
                r#"
                [layout]
                node_width = 200

                [api]
                profile_base = "/persones"
                "#,
            )?;
            jail.set_env("ARBRE_TREE__DEPTH", "6");
            jail.set_env("ARBRE_LAYOUT__NODE_WIDTH", "220");

            let config = Config::load().map_err(|e| e.to_string())?;
            assert_eq!(config.layout.node_width, 220.0);
            assert_eq!(config.layout.h_gap, 32.0);
            assert_eq!(config.tree.depth, 6);
            assert_eq!(config.api.profile_base, "/persones");
            Ok(())
        });
    }

    #[test]
    fn test_invalid_value_is_reported() {
        Jail::expect_with(|jail| {
            jail.create_file(PROJECT_CONFIG, "[tree]\ndepth = \"deep\"\n")?;
            assert!(Config::load().is_err());
            Ok(())
        });
    }
}
