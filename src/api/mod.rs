//! mod `api` provides the topmost fundamental APIs for building a `Dispatcher` from configuration.
//! The hub supports three ways to perform initialization:
//!
//!  1. `init_default()`, using default config and the system environment.
//!  2. `init_with_config(config_entity: ConfigEntity)`, using customized config entity.
//!  3. `init_with_config_file(config_path: &str)`, using yaml file.
//!
//! Each of them installs the logger, then registers every configured endpoint.
//! To attach an error tracker or listeners, pass the loaded entity to
//! `DispatcherBuilder::with_config` instead.
//!
//! ```
//! use integration_hub::{CallOutcome, Error};
//!
//! let dispatcher = integration_hub::init_with_config_file("testdata/config/hub.yaml")?;
//! let sms = SmsClient::connect(credentials);
//! match dispatcher.invoke("sms-provider", || sms.send("+100000000", "your code is 4242"))? {
//!     CallOutcome::Success(_) => {}
//!     CallOutcome::Failure(err) => integration_hub::logging::warn!("sms not sent: {:?}", err),
//!     CallOutcome::Rejected(reason) => integration_hub::logging::info!("sms skipped: {}", reason),
//! }
//! ```

mod init;

pub use init::*;
