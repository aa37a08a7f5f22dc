//! Administrative-rights checks

use upnotify_errors::PlatformError;

/// Whether the current process runs with an effective uid of root
#[must_use]
pub fn is_privileged() -> bool {
    #[allow(unsafe_code)]
    // SAFETY: geteuid has no preconditions and cannot fail
    let euid = unsafe { libc::geteuid() };
    euid == 0
}

/// Fail with `NotPrivileged` unless running as root
///
/// # Errors
///
/// Returns `PlatformError::NotPrivileged` naming `operation` when the
/// effective uid is not 0.
pub fn require_root(operation: &str) -> Result<(), PlatformError> {
    if is_privileged() {
        Ok(())
    } else {
        Err(PlatformError::NotPrivileged {
            operation: operation.to_string(),
        })
    }
}
