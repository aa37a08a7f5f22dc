//! Numeric codes carried by `OperationEvent::ErrorRaised`
//!
//! Backends may report codes outside this table; `describe` falls back to a
//! generic description for them.

/// Cause unknown
pub const UNKNOWN: i32 = 0;
/// A package failed to configure, unpack or remove
pub const PACKAGE_FAILED: i32 = 1;
/// A package or index download failed
pub const DOWNLOAD_FAILED: i32 = 2;
/// Refreshing the package lists failed
pub const CACHE_UPDATE_FAILED: i32 = 3;
/// The package system is locked by another process
pub const PACKAGE_MANAGER_LOCKED: i32 = 4;
/// The operation could not be started at all
pub const LAUNCH_FAILED: i32 = 10;
/// The privilege wrapper refused or the user dismissed authentication
pub const NOT_AUTHORIZED: i32 = 11;
/// The backend stopped without reporting completion
pub const BACKEND_TERMINATED: i32 = 12;
/// The backend reported failure without raising an error first
pub const OPERATION_FAILED: i32 = 13;

/// Short description of an error code
#[must_use]
pub fn describe(code: i32) -> &'static str {
    match code {
        PACKAGE_FAILED => "Package operation failed",
        DOWNLOAD_FAILED => "Failed to download package files",
        CACHE_UPDATE_FAILED => "Failed to download repository information",
        PACKAGE_MANAGER_LOCKED => "The package system is locked",
        LAUNCH_FAILED => "Could not start the upgrade",
        NOT_AUTHORIZED => "Not authorized",
        BACKEND_TERMINATED => "The upgrade stopped unexpectedly",
        OPERATION_FAILED => "The upgrade failed",
        _ => "Unknown error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_codes_have_a_fallback() {
        assert_eq!(describe(UNKNOWN), "Unknown error");
        assert_eq!(describe(4242), "Unknown error");
        assert_eq!(describe(NOT_AUTHORIZED), "Not authorized");
    }
}
