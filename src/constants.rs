/// Default auto-refresh period.
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 2000;

/// Lower bound for the auto-refresh period.
pub const MIN_REFRESH_INTERVAL_MS: u64 = 250;

/// Audit log lines fetched when the requested count does not parse.
pub const DEFAULT_AUDIT_TAIL: u32 = 100;

/// Weight used for registrations without a (valid) weight, same as the control plane.
pub const DEFAULT_REGISTER_WEIGHT: u32 = 10;

/// Placeholder for absent values in the table.
pub const PLACEHOLDER: &str = "-";

/// Version from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
