//! Unix socket file helpers for the ingest listener

use anyhow::{Context, Result};
use std::path::Path;

/// Remove a stale socket file, ignoring a missing one
///
/// Run before every bind so a crashed previous instance never blocks
/// startup.
pub fn remove_stale_socket(socket_path: &Path) {
    let _ = std::fs::remove_file(socket_path);
}

/// Set permissions on the bound ingest socket
///
/// World-writable (0666) matches the open local trust model where any local
/// process may publish; the restricted mode (0660) scopes publishing to the
/// daemon's own user and group.
#[cfg(unix)]
pub fn set_socket_permissions(socket_path: &Path, world_writable: bool) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = if world_writable { 0o666 } else { 0o660 };
    let permissions = std::fs::Permissions::from_mode(mode);
    std::fs::set_permissions(socket_path, permissions)
        .context("Failed to set ingest socket permissions")?;

    Ok(())
}

#[cfg(not(unix))]
pub fn set_socket_permissions(_socket_path: &Path, _world_writable: bool) -> Result<()> {
    // Non-Unix platforms don't use Unix sockets
    Ok(())
}
