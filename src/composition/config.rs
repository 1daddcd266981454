//! Tunable policy (`SPEC_FULL.md` §4.9). Small, `Default`-able settings struct handed to the
//! top-level constructor, the way this corpus's engines take a `Config` value.

use crate::composition::clip::Priority;

/// How ties between clips sharing an identical `(start, priority)` or `(stop, priority)` are
/// broken. Currently always registration order (`spec.md` §9's first Open Question); kept as
/// an enum of one variant so the decision has a name and a place to grow, rather than being a
/// hardcoded comparator buried in the resolver.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum TieBreak {
    #[default]
    RegistrationSequence,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Config {
    /// Stack Resolver step 2 (`spec.md` §4.2) only considers clips at or above this priority
    /// (i.e. with a numerically smaller-or-equal value). Defaults to no floor.
    pub priority_floor: Priority,
    pub tie_break: TieBreak,
    /// When false, a `BadFormat` event is still ignored, but no log line is emitted for it.
    pub log_bad_format: bool,
}
impl Default for Config {
    fn default() -> Self {
        Config {
            priority_floor: Priority::TOP,
            tie_break: TieBreak::default(),
            log_bad_format: true,
        }
    }
}
