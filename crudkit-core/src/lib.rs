//! # crudkit-core
//!
//! Ambient runtime shared by the crudkit crates: layered configuration
//! ([`config`]), tracing setup and the [`ManagedResource`] lifecycle used by
//! database sessions.

pub mod config;
pub mod managed;
pub mod tracing_setup;

pub use config::{ConfigError, ConfigProperties, ConfigValue, CrudkitConfig, PropertyMeta};
pub use managed::{run_managed, ManagedResource};
pub use tracing_setup::{init_tracing, init_tracing_with};

pub mod prelude {
    //! Re-exports of the most commonly used core types.
    pub use crate::config::{ConfigError, ConfigProperties, ConfigValue, CrudkitConfig, FromConfigValue};
    pub use crate::managed::ManagedResource;
    pub use crate::init_tracing;
}
