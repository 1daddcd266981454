//! Error kinds (`spec.md` §7; `SPEC_FULL.md` §4.10).
//!
//! Plain structs/enums implementing [`std::error::Error`] by hand, the way this corpus writes
//! its error types (see e.g. `key_generator::OverflowError` in the teacher crate) rather than
//! via `thiserror`/`anyhow`.

use std::error::Error;
use std::fmt::{self, Display};

use crate::composition::clip::ClipId;

/// Registration rejected a non-clip or invalid registration (`spec.md` §4.1, §7).
///
/// `spec.md` §6 also calls out double-`add()` as a rejection, but that's keyed on the identity
/// of an already-registered clip; `ClipId`s are minted by the registry itself at `add()` time
/// (`SPEC_FULL.md` §9's "duplicate add rejection is keyed on object identity" supplement), so
/// there is no caller-supplied id for a second `add()` to collide with — calling `add()` again
/// simply registers a second, independent clip.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rejected {
    /// `stop` was not strictly greater than `start`.
    NonPositiveDuration { start_ns: u64, stop_ns: u64 },
    /// An operation clip was registered with arity 0; an operation must consume at least one
    /// stack slot (`spec.md` §3).
    ZeroArityOperation,
}
impl Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejected::NonPositiveDuration { start_ns, stop_ns } => write!(
                f,
                "clip stop ({stop_ns}ns) must be strictly after start ({start_ns}ns)"
            ),
            Rejected::ZeroArityOperation => {
                write!(f, "an operation clip must have arity of at least 1")
            }
        }
    }
}
impl Error for Rejected {}

/// `remove()` (or any per-clip operation) of an unknown `ClipId` (`spec.md` §4.1, §7).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct NotPresent(pub ClipId);
impl Display for NotPresent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clip {:?} is not registered", self.0)
    }
}
impl Error for NotPresent {}
