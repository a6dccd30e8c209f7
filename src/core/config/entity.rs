use super::constant::*;
use crate::{base::ServiceEndpoint, isolation::OverloadPolicy, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    // app_name represents the name of current running service.
    pub app_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            app_name: DEFAULT_APP_NAME.into(),
        }
    }
}

// LogConfig represent the configuration of logging in the hub.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    // config_file is the log4rs configuration, only read with feature `logger_log4rs`
    pub config_file: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            config_file: LOG_CONFIG_FILE.into(),
        }
    }
}

// DispatcherConfig represents the endpoints to register and how they are guarded.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DispatcherConfig {
    // overload_policy applies to every endpoint with a positive max_concurrency
    pub overload_policy: OverloadPolicy,
    // tracker_queue_size bounds the events waiting for the error tracker
    pub tracker_queue_size: usize,
    pub endpoints: Vec<ServiceEndpoint>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig {
            overload_policy: OverloadPolicy::default(),
            tracker_queue_size: DEFAULT_TRACKER_QUEUE_SIZE,
            endpoints: Vec::new(),
        }
    }
}

// HubConfig represent the general configuration of the hub.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct HubConfig {
    pub app: AppConfig,
    pub log: LogConfig,
    pub dispatcher: DispatcherConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ConfigEntity {
    pub version: String,
    pub config: HubConfig,
}

impl Default for ConfigEntity {
    fn default() -> Self {
        ConfigEntity {
            version: HUB_CONFIG_VERSION.into(),
            config: HubConfig::default(),
        }
    }
}

impl ConfigEntity {
    pub fn new() -> Self {
        ConfigEntity::default()
    }

    pub fn check(&self) -> Result<()> {
        if self.version.is_empty() {
            return Err(Error::msg("empty version"));
        }
        if self.config.app.app_name.is_empty() {
            return Err(Error::msg("empty app name"));
        }
        if self.config.dispatcher.tracker_queue_size == 0 {
            return Err(Error::msg(
                "illegal dispatcher configuration: tracker_queue_size == 0",
            ));
        }
        let mut names = HashSet::new();
        for endpoint in &self.config.dispatcher.endpoints {
            endpoint.is_valid()?;
            if !names.insert(endpoint.name.as_str()) {
                return Err(Error::msg(format!(
                    "illegal dispatcher configuration: endpoint {} is configured twice",
                    endpoint.name
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for ConfigEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(self) {
            Ok(fmtted) => write!(f, "{}", fmtted),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}
