pub mod repeats;

pub use repeats::{non_repeat_ranges, NoRepeats, PeriodicRepeatFinder, RepeatFinder};
