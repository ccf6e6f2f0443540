pub mod errors;
pub mod id;
pub mod types;

pub use errors::{ConfigError, HostError, MinimapError, PlatformError};
pub use id::{new_credential, SessionContext};
pub use types::{Bound, BoundUpdate, ModeFlags};

pub type Result<T> = std::result::Result<T, MinimapError>;
