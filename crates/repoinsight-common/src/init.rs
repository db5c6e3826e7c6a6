//! Process environment bootstrap

use std::sync::Once;

static INIT: Once = Once::new();

/// Load `.env` into the process environment exactly once.
///
/// Missing `.env` files are fine; explicit environment variables always
/// win over file contents.
pub fn initialize_environment() {
    INIT.call_once(|| {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!("Failed to load .env: {e}"),
        }
    });
}
