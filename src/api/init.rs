//! Initialization builds the hub's runtime environment:
//! 1. resolve the config, from a hand-crafted entity or a yaml file, overridden by env variables
//! 2. initialize the global logger
//! 3. build a dispatcher with every configured endpoint registered

use crate::{
    config::{self, ConfigEntity},
    Dispatcher, Result,
};

/// `init_default` builds a dispatcher using the configuration from system
/// environment and the default value.
#[inline]
pub fn init_default() -> Result<Dispatcher> {
    init_hub("")
}

/// `init_with_config` builds a dispatcher using given config.
/// Environment items still take priority over the entity.
pub fn init_with_config(mut config_entity: ConfigEntity) -> Result<Dispatcher> {
    config_entity.check()?;
    config::override_items_from_system_env(&mut config_entity)?;
    build_dispatcher(&config_entity)
}

/// `init_with_config_file` loads the general configuration from the given YAML file
/// and builds a dispatcher.
#[inline]
pub fn init_with_config_file(config_path: &str) -> Result<Dispatcher> {
    init_hub(config_path)
}

#[inline]
fn init_hub(config_path: &str) -> Result<Dispatcher> {
    let config_entity = config::load_config(config_path)?;
    build_dispatcher(&config_entity)
}

fn build_dispatcher(config_entity: &ConfigEntity) -> Result<Dispatcher> {
    config::init_log(config_entity);
    Dispatcher::builder().with_config(config_entity).build()
}
