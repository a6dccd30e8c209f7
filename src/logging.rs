use cfg_if::cfg_if;
use lazy_static::lazy_static;
pub use log::{debug, error, info, trace, warn};
use std::sync::Once;

lazy_static! {
    pub static ref FREQUENT_ERROR_ONCE: Once = Once::new();
    static ref LOGGER_INIT_ONCE: Once = Once::new();
}

/// `logger_init` installs the logging backend selected by the crate features.
/// Only the first call has an effect, later calls are no-ops.
pub fn logger_init(file_name: Option<String>) {
    LOGGER_INIT_ONCE.call_once(move || backend_init(file_name));
}

cfg_if! {
    if #[cfg(feature = "logger_env")] {
        use crate::config::DEFAULT_LOG_LEVEL;
        fn backend_init(_: Option<String>) {
            // the embedding application may have installed its own logger already
            if let Err(err) = env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or(DEFAULT_LOG_LEVEL),
            )
            .try_init()
            {
                warn!("[Logging] env_logger not installed: {}", err);
            }
        }
    }
    else if #[cfg(feature = "logger_log4rs")] {
        use std::path::Path;
        fn backend_init(file_name: Option<String>) {
            let file_name = match file_name {
                Some(file_name) => file_name,
                None => return,
            };
            let path = Path::new(&file_name);
            if path.exists() {
                if let Err(err) = log4rs::init_file(path, Default::default()) {
                    eprintln!("[Logging] fail to init log4rs from {}: {:?}", file_name, err);
                }
            }
        }
    } else {
        fn backend_init(_: Option<String>) {}
    }
}
