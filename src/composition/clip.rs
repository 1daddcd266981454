//! The data model (`spec.md` §3): clips, time, and priority.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::composition::utils::key_generator::key_type;

key_type!(ClipId, u64);

/// A point in time on the composition's timeline, in nanoseconds.
///
/// Newtype-wrapped so it can't silently be added to a raw sample count or an index —
/// `gnlcomposition.c`'s `GstClockTime` is the same representation (a `u64` of nanoseconds).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Time(pub u64);
impl Time {
    pub const ZERO: Time = Time(0);

    pub fn saturating_sub(self, rhs: Time) -> Time {
        Time(self.0.saturating_sub(rhs.0))
    }
}
impl fmt::Debug for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}
impl std::ops::Add for Time {
    type Output = Time;
    fn add(self, rhs: Time) -> Time {
        Time(self.0 + rhs.0)
    }
}
impl std::ops::Sub for Time {
    type Output = Time;
    fn sub(self, rhs: Time) -> Time {
        Time(self.0 - rhs.0)
    }
}

/// Lower value sorts as higher priority, i.e. nearer the top of the stack.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Priority(pub u32);
impl Priority {
    pub const TOP: Priority = Priority(0);
}
impl fmt::Debug for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Monotonically increasing counter assigned at registration time.
///
/// Resolves the tie-break Open Question in `spec.md` §9: two clips sharing an identical
/// `(start, priority)` or `(stop, priority)` are ordered by the sequence in which they were
/// registered, the same stable order `gnlcomposition.c` gets for free from `GList` insertion.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct RegistrationSeq(pub u64);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ClipKind {
    Source,
    /// `arity` is how many stack slots immediately beneath this clip it consumes.
    /// Must be >= 1; an operation of arity 0 is rejected at registration (`spec.md` §3).
    Operation { arity: u32 },
}
impl ClipKind {
    pub fn arity(&self) -> u32 {
        match self {
            ClipKind::Source => 0,
            ClipKind::Operation { arity } => *arity,
        }
    }
}

/// The registry's record for a single clip: the scheduling-relevant attributes of `spec.md` §3.
///
/// The caller-supplied [`Element`](crate::composition::framework::Element) that this clip wraps
/// is stored alongside this struct in the registry entry, not inside it — `Clip` is a plain
/// value type so the resolver and relink engine can copy and compare it freely.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Clip {
    pub id: ClipId,
    pub start: Time,
    pub stop: Time,
    pub priority: Priority,
    pub active: bool,
    pub kind: ClipKind,
    pub registration_seq: RegistrationSeq,
}
impl Clip {
    /// `stop - start`; `spec.md` §3 requires `stop > start` as an invariant checked at `add()`.
    pub fn duration(&self) -> Time {
        self.stop.saturating_sub(self.start)
    }

    /// Order key for the `by_start` index: `(start, priority, registration_seq)`.
    pub fn start_key(&self) -> (Time, Priority, RegistrationSeq) {
        (self.start, self.priority, self.registration_seq)
    }

    /// Order key for the `by_stop` index: `(stop, priority, registration_seq)`.
    pub fn stop_key(&self) -> (Time, Priority, RegistrationSeq) {
        (self.stop, self.priority, self.registration_seq)
    }
}

impl Clip {
    /// Order key used to sort resolver candidates into priority order:
    /// `(priority, registration_seq)`. Lower priority value sorts first, i.e. nearer the top.
    pub fn priority_key(&self) -> (Priority, RegistrationSeq) {
        (self.priority, self.registration_seq)
    }
}
