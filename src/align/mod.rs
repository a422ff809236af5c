pub mod extend;
pub mod result;
pub mod sw_banded;
pub mod traceback;
pub mod verify;

pub use result::{EditOp, EditStats};
pub use extend::{xdrop_extend, ExtendDirection, Extension};
pub use sw_banded::{banded_local_alignment, banded_local_alignments, BandedAlignment, BandedSwConfig};
pub use verify::{BandedLocalVerifier, VerificationWindow, Verifier};
