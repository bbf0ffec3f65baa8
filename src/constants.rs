//! Application constants for webfile
//!
//! Constants are grouped by functional domain.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Overrides the poll tick interval in milliseconds
    pub const TICK_INTERVAL_MS: &str = "WEBFILE_TICK_INTERVAL_MS";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("webfile/", env!("CARGO_PKG_VERSION"));

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;

    /// Maximum number of redirects to follow
    pub const MAX_REDIRECTS: usize = 10;
}

/// Callback polling constants
pub mod poll {
    use super::Duration;

    /// Default interval between mailbox drains (roughly one frame at 60 Hz)
    pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(16);

    /// Lower bound accepted from configuration
    pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);
}

/// Configuration file locations
pub mod files {
    /// Project-local configuration file name
    pub const LOCAL_CONFIG_FILE: &str = "webfile.toml";

    /// Application directory name under the user config directory
    pub const APP_DIR: &str = "webfile";

    /// Configuration file name inside the application directory
    pub const CONFIG_FILE: &str = "config.toml";
}
