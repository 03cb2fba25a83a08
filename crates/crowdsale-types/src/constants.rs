//! System-wide constants for the crowdsale engine.

/// Decimal places of the native value unit (wei per ether = 10^18).
pub const ETHER_DECIMALS: u32 = 18;

/// Largest number of decimal places supported by unit conversion.
pub const MAX_DECIMALS: u32 = 28;

/// Default token decimals.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// Percentage denominator for distribution shares.
pub const PERCENT_DENOMINATOR: u128 = 100;

/// Default share of the final token supply sold to participants.
pub const DEFAULT_SALE_PERCENTAGE: u8 = 70;

/// Default lock duration for reserved allocations (one year).
pub const DEFAULT_LOCK_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Maximum number of phases in a schedule.
pub const MAX_PHASES: usize = 16;

/// Maximum number of reserved distribution buckets.
pub const MAX_BUCKETS: usize = 32;

/// Maximum identities accepted by one allow-list batch call.
pub const MAX_ALLOW_LIST_BATCH: usize = 1_000;

/// Domain tag for deterministic lock holder addresses.
pub const LOCK_ADDRESS_DOMAIN: &[u8] = b"timelock";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Crowdsale";
