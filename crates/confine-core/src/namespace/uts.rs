//! UTS namespace identity.
//!
//! Gives the container its own hostname, visible to everything that runs
//! inside it.

use confine_common::error::{ConfineError, Result};
use confine_common::types::Hostname;

/// Sets the hostname inside the UTS namespace.
///
/// Called by the child after the fork; the parent's hostname is untouched
/// because the UTS namespace was unshared beforehand.
///
/// # Errors
///
/// Returns [`ConfineError::Isolation`] if `sethostname(2)` fails.
pub fn set_hostname(hostname: &Hostname) -> Result<()> {
    nix::unistd::sethostname(hostname.as_str()).map_err(|e| ConfineError::Isolation {
        message: format!("sethostname({hostname}) failed: {e}"),
    })?;
    tracing::debug!(%hostname, "container hostname set");
    Ok(())
}
