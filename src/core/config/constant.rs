// default app settings
pub const HUB_CONFIG_VERSION: &str = "v1";
pub const DEFAULT_APP_NAME: &str = "unknown_service";
pub const APP_NAME_ENV_KEY: &str = "HUB_APP_NAME";
pub const CONF_FILE_PATH_ENV_KEY: &str = "HUB_CONFIG_FILE_PATH";
pub const OVERLOAD_POLICY_ENV_KEY: &str = "HUB_OVERLOAD_POLICY";
pub const CONFIG_FILENAME: &str = "USE_DEFAULT_CONFIGURATION";

// default endpoint settings
pub const DEFAULT_FAILURE_THRESHOLD: u64 = 5;
pub const DEFAULT_OPEN_TIMEOUT_MS: u64 = 60_000;

// default error tracker settings
pub const DEFAULT_TRACKER_QUEUE_SIZE: usize = 1024;

// default log settings
pub const DEFAULT_LOG_LEVEL: &str = "warn";
pub const LOG_CONFIG_FILE: &str = "testdata/config/log4rs.yaml";
