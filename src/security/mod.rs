//! Security utilities.
//!
//! Everything the uploader logs passes through credential scrubbing: the
//! process environment recorded at start-up and the captured output of client
//! runs that failed.

pub mod credential_scrubber;

pub use credential_scrubber::{is_sensitive_env_name, scrub_credentials, scrub_environment};
