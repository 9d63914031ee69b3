//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (YAML)
//!     → loader.rs (read & parse)
//!     → schema.rs (structural checks, coercions, cross-references)
//!     → model.rs (typed Configuration with derived views)
//!     → manager.rs (ArcSwap snapshot shared with all readers)
//!
//! On settings save:
//!     store.rs validates the candidate text
//!     → copies the previous file to <path>.bak
//!     → writes the new text
//!     → caller triggers an explicit reload()
//! ```
//!
//! # Design Decisions
//! - A Configuration is immutable once built; changes require a full reload
//! - Reload is explicit and synchronous; nothing watches the file
//! - A failed reload never disturbs the currently published snapshot

pub mod loader;
pub mod manager;
pub mod model;
pub mod schema;
pub mod store;

pub use loader::ConfigError;
pub use manager::ConfigManager;
pub use model::Configuration;
pub use schema::SchemaError;
