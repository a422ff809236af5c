pub mod filter;
pub mod options;

pub use filter::{FilterMode, SwiftParameters, VerificationStrategy};
pub use options::{StellarOptions, VerificationScoring, MAX_EPSILON};
