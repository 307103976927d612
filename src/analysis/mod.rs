//! Analysis Layer
//!
//! Decision logic applied to vision output. Currently a single check:
//! whether the detected label is printed on the bottle.

pub mod verification;

pub use verification::{verify, VerificationOutcome, VERIFICATION_THRESHOLD};
