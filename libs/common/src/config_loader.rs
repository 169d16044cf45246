//! Layered configuration loading
//!
//! Priority (highest to lowest):
//! 1. Environment variables (`<SERVICE>_` prefix, `__` separates nesting)
//! 2. Explicit config file (`--config`)
//! 3. `<config_dir>/<service>.toml`
//! 4. `<config_dir>/<service>.yaml`
//! 5. Default values

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Builder for a service's layered configuration
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    service_name: String,
    config_dir: PathBuf,
    explicit_file: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    pub fn new(service_name: impl Into<String>) -> Self {
        let service_name = service_name.into();
        let env_prefix = format!("{}_", service_name.to_uppercase());
        Self {
            service_name,
            config_dir: PathBuf::from("config"),
            explicit_file: None,
            env_prefix,
        }
    }

    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    /// File named on the command line; it must exist
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn env_prefix(&self) -> &str {
        &self.env_prefix
    }

    /// Assemble the provider stack without extracting
    pub fn figment<T>(&self) -> Result<Figment>
    where
        T: Serialize + Default,
    {
        let mut figment = Figment::from(Serialized::defaults(T::default()))
            .merge(Yaml::file(
                self.config_dir.join(format!("{}.yaml", self.service_name)),
            ))
            .merge(Toml::file(
                self.config_dir.join(format!("{}.toml", self.service_name)),
            ));

        if let Some(path) = &self.explicit_file {
            if !path.is_file() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            figment = merge_file(figment, path)?;
        }

        Ok(figment.merge(Env::prefixed(&self.env_prefix).split("__")))
    }

    pub fn load<T>(&self) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        let config = self
            .figment::<T>()?
            .extract()
            .map_err(|e| Error::Config(format!("Failed to load configuration: {}", e)))?;
        debug!(
            "Loaded {} configuration (dir {:?}, file {:?})",
            self.service_name, self.config_dir, self.explicit_file
        );
        Ok(config)
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Config("Config file must have an extension".to_string()))?;

    match extension {
        "toml" => Ok(figment.merge(Toml::file(path))),
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        "json" => Ok(figment.merge(Json::file(path))),
        _ => Err(Error::Config(format!(
            "Unsupported config file format: {}",
            extension
        ))),
    }
}

/// Load configuration from a single file
pub fn load_config_from_file<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    merge_file(Figment::new(), path.as_ref())?
        .extract()
        .map_err(|e| Error::Config(format!("Failed to load configuration from file: {}", e)))
}
