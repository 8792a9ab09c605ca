//! Support for library configuration options

use std::sync::{Arc, Mutex};
use std::time::Duration;

use once_cell::sync::Lazy;

/// Part of the ProdID string that describes the organization (example of a ProdID string: `-//ABC Corporation//My Product//EN`).
/// Feel free to override it when initing this library.
pub static ORG_NAME: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("My organization".to_string())));

/// Part of the ProdID string that describes the product name (example of a ProdID string: `-//ABC Corporation//My Product//EN`).
/// Feel free to override it when initing this library.
pub static PRODUCT_NAME: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("Corkboard".to_string())));

/// The timezone applied to feed date-times that carry no zone information ("floating" times)
pub const FALLBACK_TIMEZONE: &str = "America/New_York";

/// How long to wait for a single feed before giving up on it.
/// A slow external host must not stall the whole calendar view.
pub const FEED_TIMEOUT: Duration = Duration::from_secs(10);
