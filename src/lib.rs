//! Configuration core for a ProxySQL/MySQL admin console.
//!
//! The web layer consumes this crate through two surfaces: the
//! [`ConfigManager`] snapshot lifecycle and the policy lookups on
//! [`Configuration`]. Everything else (HTTP, sessions, templates, SQL
//! execution) lives outside and only receives DSNs and policy answers.

pub mod config;
pub mod policy;

pub use config::loader::ConfigError;
pub use config::manager::ConfigManager;
pub use config::model::Configuration;
pub use config::schema::SchemaError;
pub use config::store::SourceFile;
pub use policy::LookupError;
