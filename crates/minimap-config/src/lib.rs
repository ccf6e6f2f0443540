//! Persisted minimap settings.
//!
//! The settings file is a flat JSON record (`plugin.setting.json`) holding
//! the element geometry, the content URL list, the debug switch and the
//! opacity. Loading never fails: a missing or corrupt file yields the
//! canonical defaults, and individual missing or mistyped keys are repaired
//! one by one. The reconciled record is written back immediately so the file
//! on disk is always normalized.
//!
//! ```rust,no_run
//! use minimap_config::{ConfigStore, SETTINGS_FILE};
//!
//! let store = ConfigStore::new(SETTINGS_FILE);
//! let config = store.load();
//! println!("{}", config.content_url());
//! ```

pub mod merge;
pub mod schema;
pub mod store;

pub use merge::{merge, MergeOutcome, ValueKind, CANONICAL_KEYS};
pub use schema::{Configuration, DEFAULT_CONTENT_URL};
pub use store::{ConfigStore, SETTINGS_FILE};
