//! Process exit codes (BSD sysexits.h compatible where one applies)

use nnev_core::Error;

/// Successful termination
pub const OK: i32 = 0;

/// Any failure without a more specific code
pub const FAILURE: i32 = 1;

/// Directory server unreachable or too slow
pub const UNAVAILABLE: i32 = 69;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;

/// Picks the exit code for a failed command.
pub fn for_error(err: &anyhow::Error) -> i32 {
    match err.chain().find_map(|cause| cause.downcast_ref::<Error>()) {
        Some(Error::ServiceUnavailable(_) | Error::Timeout(_)) => UNAVAILABLE,
        Some(Error::ConfigError(_) | Error::ValidationError(_)) => CONFIG,
        Some(Error::Io(_)) => IOERR,
        _ => FAILURE,
    }
}
