//! byline — accounts and sessions for a multi-author publishing platform.
//!
//! The crate gates access to protected operations with signed session
//! tokens, stores credentials only as salted hashes and scopes every
//! profile mutation to the identity carried by the verified token.

pub mod account;
pub mod api;
pub mod cli;
