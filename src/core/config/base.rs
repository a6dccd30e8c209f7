use super::{constant::*, ConfigEntity};
use crate::{isolation::OverloadPolicy, logging, utils, Error, Result};
use std::env;
use std::fs;
use std::path::Path;

/// `load_config` resolves the configuration entity.
/// If `config_path` is blank, the path is read from `HUB_CONFIG_FILE_PATH`,
/// and without it the default config is used. Environment items are applied last.
pub fn load_config(config_path: &str) -> Result<ConfigEntity> {
    let mut entity = load_config_from_yaml_file(&resolve_config_path(config_path))?;
    override_items_from_system_env(&mut entity)?;
    Ok(entity)
}

fn resolve_config_path(config_path: &str) -> String {
    if utils::is_blank(config_path) {
        // If the config file path is absent, the hub will try to resolve it from the system env.
        env::var(CONF_FILE_PATH_ENV_KEY).unwrap_or_else(|_| CONFIG_FILENAME.into())
    } else {
        config_path.into()
    }
}

/// `load_config_from_yaml_file` loads the entity from the given YAML file.
/// The placeholder `CONFIG_FILENAME` stands for the default config.
pub fn load_config_from_yaml_file(path_str: &str) -> Result<ConfigEntity> {
    if path_str == CONFIG_FILENAME {
        return Ok(ConfigEntity::default());
    }
    let path = Path::new(path_str);
    if !path.exists() {
        return Err(Error::msg(format!(
            "hub YAML configuration file {} does not exist!",
            path_str
        )));
    }
    let content = fs::read_to_string(path)?;
    let entity: ConfigEntity = serde_yaml::from_str(&content)?;
    entity.check()?;
    logging::info!("[Config] Resolving hub config from file, file {}", path_str);
    Ok(entity)
}

/// `override_items_from_system_env` applies `HUB_APP_NAME` and `HUB_OVERLOAD_POLICY`.
pub fn override_items_from_system_env(entity: &mut ConfigEntity) -> Result<()> {
    override_items(entity, |key| env::var(key).ok())
}

fn override_items<F>(entity: &mut ConfigEntity, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(app_name) = lookup(APP_NAME_ENV_KEY) {
        if !utils::is_blank(&app_name) {
            entity.config.app.app_name = app_name;
        }
    }
    if let Some(policy) = lookup(OVERLOAD_POLICY_ENV_KEY) {
        if !utils::is_blank(&policy) {
            entity.config.dispatcher.overload_policy = policy.parse::<OverloadPolicy>()?;
        }
    }
    entity.check()
}

/// `init_log` installs the logging backend and prints the effective config.
pub fn init_log(entity: &ConfigEntity) {
    logging::logger_init(Some(entity.config.log.config_file.clone()));
    logging::info!(
        "[Config] App name resolved, appName {}",
        entity.config.app.app_name
    );
    logging::info!(
        "[Config] Print effective global config, globalConfig {}",
        entity
    );
}
