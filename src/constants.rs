//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Retry/backoff constants for provider calls
pub mod retry {
    /// Maximum attempts per generation call (first try included)
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 1000;

    /// Upper bound for a single backoff delay (milliseconds)
    pub const MAX_DELAY_MS: u64 = 60_000;

    /// Upper bound for provider-supplied retry-after hints (seconds)
    pub const MAX_RETRY_AFTER_SECS: u64 = 300;
}

/// HTTP/Network constants
pub mod network {
    /// Default per-attempt request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;

    /// Idle connections kept per provider host
    pub const POOL_MAX_IDLE_PER_HOST: usize = 5;
}

/// Prompt construction constants
pub mod prompt {
    /// Source characters included in a prompt before truncation
    pub const MAX_CODE_CHARS: usize = 50_000;

    /// Source characters accepted at all; larger inputs are rejected
    pub const MAX_INPUT_CHARS: usize = 500_000;

    /// Default output budget for generated documentation
    pub const DEFAULT_MAX_TOKENS: u32 = 4096;

    /// Marker appended when the source is cut
    pub const TRUNCATION_MARKER: &str = "// ... [truncated]";

    /// Function/class names listed in the analysis summary before eliding
    pub const MAX_LISTED_SYMBOLS: usize = 50;
}

/// Code analysis constants
pub mod analysis {
    /// Branch count above which code is "complex"
    pub const COMPLEX_BRANCHES: usize = 15;

    /// Branch count above which code is "medium"
    pub const MEDIUM_BRANCHES: usize = 5;

    /// Function count above which structurally parsed code is "complex"
    pub const COMPLEX_FUNCTIONS: usize = 20;

    /// Function count above which structurally parsed code is "medium"
    pub const MEDIUM_FUNCTIONS: usize = 8;

    /// Function count above which fallback-analyzed code is "complex"
    pub const FALLBACK_COMPLEX_FUNCTIONS: usize = 20;

    /// Function count above which fallback-analyzed code is "medium"
    pub const FALLBACK_MEDIUM_FUNCTIONS: usize = 10;
}

/// Quality scoring constants
pub mod scoring {
    /// Share of max points required for a "complete" criterion (percent)
    pub const COMPLETE_THRESHOLD_PCT: u32 = 90;

    /// Intro paragraph word count that earns full overview credit
    pub const OVERVIEW_FULL_WORDS: usize = 30;

    /// Intro paragraph word count that earns partial overview credit
    pub const OVERVIEW_PARTIAL_WORDS: usize = 10;

    /// Lines searched around a name for describing prose
    pub const REFERENCE_WINDOW_LINES: usize = 3;

    /// Prose words near a name for it to count as documented
    pub const REFERENCE_MIN_WORDS: usize = 5;

    /// Heading count that earns the full heading-count share
    pub const FULL_HEADING_COUNT: usize = 6;
}
