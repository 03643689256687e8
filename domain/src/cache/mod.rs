//! Result cache keys
//!
//! The cache itself (TTL bookkeeping, shared map) is an application
//! service; the domain only decides what makes two requests equivalent.

pub mod fingerprint;

pub use fingerprint::Fingerprint;
