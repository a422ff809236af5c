pub mod align;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod post;
pub mod seed;
pub mod stellar;
pub mod swift;
pub mod utils;

pub use config::{FilterMode, StellarOptions, SwiftParameters};
pub use error::{Result, SwiftError};
pub use post::{BoundedMatchStore, EpsMatch};
pub use seed::{QGramIndex, Shape};
pub use stellar::{run_stellar, run_stellar_with, StellarResult, Strand};
pub use swift::{Hit, SwiftFilter};
