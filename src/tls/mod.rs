//! TLS certificate inspection.
//!
//! - `probe` - single fully-validated handshake against `host:443` returning
//!   the leaf certificate's expiry
//! - `prober` - bounded concurrent fan-out of `probe` over a candidate set,
//!   with positionally stable results and a per-cycle deadline

pub mod probe;
pub mod prober;

// Re-export commonly used types
pub use probe::{CONNECT_TIMEOUT, TLS_PORT, ensure_crypto_provider, probe_certificate};
pub use prober::{DEFAULT_CONCURRENCY, DEFAULT_DEADLINE, ProbeOptions, probe_all};
