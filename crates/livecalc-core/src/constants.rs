//! ─── LiveCalc Core Constants ────────────────────────────────────────────────

// ── Policy bounds ─────────────────────────────────────────────────────────────

/// Maximum valid policyholder age (inclusive).
pub const MAX_AGE: u8 = 120;

/// Maximum policy term in years.
pub const MAX_TERM_YEARS: u8 = 50;

/// Minimum policy term in years.
pub const MIN_TERM_YEARS: u8 = 1;

// ── Mortality table layout ────────────────────────────────────────────────────

/// Number of age buckets per gender in a flattened mortality table (ages 0..=120).
pub const MORTALITY_AGES_PER_GENDER: usize = MAX_AGE as usize + 1;

/// Total element count of a flattened mortality table (Male ages, then Female ages).
pub const MORTALITY_TABLE_LEN: usize = MORTALITY_AGES_PER_GENDER * 2;

/// Index offset into the flattened mortality table where the Female block begins.
pub const MORTALITY_FEMALE_OFFSET: usize = MORTALITY_AGES_PER_GENDER;

// ── Lapse table layout ─────────────────────────────────────────────────────────

/// Number of policy years covered by a lapse table (years 1..=50).
pub const LAPSE_TABLE_LEN: usize = 50;

// ── Expense table layout ───────────────────────────────────────────────────────

/// Flattened expense table element count: acquisition, maintenance, pct_premium, per_claim.
pub const EXPENSE_TABLE_LEN: usize = 4;

// ── Scenario layout ────────────────────────────────────────────────────────────

/// Number of annual rates in a single economic scenario.
pub const SCENARIO_YEARS: usize = 50;

// ── Valuation kernel ───────────────────────────────────────────────────────────

/// Projection stops once `lives` falls below this threshold.
pub const LIVES_EPSILON: f64 = 1e-3;

/// Default stress multiplier applied to mortality/lapse/expense tables.
pub const DEFAULT_MULTIPLIER: f64 = 1.0;

/// Default per-UDF-call timeout.
pub const DEFAULT_UDF_TIMEOUT_MS: u64 = 1000;

// ── Assumption cache ───────────────────────────────────────────────────────────

/// Cache-key substrings that mark a version as mutable (never cached).
pub const MUTABLE_TAG_LATEST: &str = ":latest";
pub const MUTABLE_TAG_DRAFT: &str = ":draft";

/// Default cache byte budget (500 MiB).
pub const DEFAULT_CACHE_BUDGET_BYTES: u64 = 500 * 1024 * 1024;

/// Binary cache file magic byte ('B' for "binary cache").
pub const CACHE_FILE_MAGIC: u8 = 0x42;

/// Binary cache file schema version.
pub const CACHE_FILE_VERSION: u8 = 0x01;

// ── Token handler ──────────────────────────────────────────────────────────────

/// Token is considered stale once fewer than this many seconds remain until expiry.
pub const TOKEN_REFRESH_THRESHOLD_SECONDS: i64 = 5 * 60;

// ── HTTP transport ─────────────────────────────────────────────────────────────

/// Default per-client request timeout.
pub const DEFAULT_TRANSPORT_TIMEOUT_SECS: u64 = 30;

/// Maximum total attempts (1 initial + up to 2 retries) per request.
pub const MAX_TRANSPORT_ATTEMPTS: u32 = 3;

/// Fixed backoff delays, indexed by attempt number. Only the first two are
/// ever consulted (with `MAX_TRANSPORT_ATTEMPTS = 3`: the loop sleeps
/// between attempts 0→1 and 1→2 but not after the final attempt), but the
/// table carries three entries to mirror `RETRY_DELAYS_MS`.
pub const TRANSPORT_RETRY_DELAYS_MS: [u64; 3] = [1000, 2000, 4000];
