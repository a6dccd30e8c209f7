//! Configuration of the hub.
//!
//! Priority: system environment > YAML file > default config.

pub mod base;
pub mod constant;
pub mod entity;

pub use base::*;
pub use constant::*;
pub use entity::*;
