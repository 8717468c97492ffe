//! Application constants and configuration

use std::time::Duration;

pub const APP_NAME: &str = "Token Catalog Desk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable that overrides the backend base URL
pub const BACKEND_URL_ENV: &str = "TOKEN_CATALOG_BACKEND_URL";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Cached query data older than this is refetched in the background
pub const STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// Keyed queries nobody has read for this long are dropped from memory
pub const CACHE_GC_TIME: Duration = Duration::from_secs(5 * 60);
pub const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Page size for the infinite-scroll browse feed
pub const BROWSE_PAGE_SIZE: u32 = 12;
/// Fixed page size for the admin table
pub const ADMIN_PAGE_SIZE: u32 = 10;

/// Distance from the end of the feed (in points) that triggers the next page
pub const LOAD_MORE_MARGIN: f32 = 100.0;

pub const MAX_LOGO_BYTES: u64 = 5 * 1024 * 1024;

pub const TOAST_DURATION: Duration = Duration::from_secs(4);
pub const COPIED_FEEDBACK: Duration = Duration::from_secs(2);
