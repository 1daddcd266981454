//! Stand-ins for the external media processing framework (`spec.md` §1, §6; `SPEC_FULL.md` §4.0).
//!
//! `spec.md` treats the underlying graph/pad/bus/state-machine framework as an external
//! collaborator and specifies only its interface. These traits are that interface, concrete
//! enough to implement and test against without depending on a real media framework.

use std::fmt::Debug;

use crate::composition::clip::Time;

/// An opaque output port handle. The only operations the scheduler needs of a pad are to
/// hold onto it and compare it against the one the composition previously targeted.
pub trait Pad: Clone + PartialEq + Debug {}
impl<T: Clone + PartialEq + Debug> Pad for T {}

/// The framework's state machine (`spec.md` §1): `Null -> Ready -> Paused -> Playing`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ElementState {
    Null,
    Ready,
    Paused,
    Playing,
}

/// A clip's underlying media object, as seen by the scheduler: something with an output pad
/// that may not exist yet, and a state that can be driven.
///
/// `Clone` is required so the facade can take an owned handle out of the registry and call
/// back into it after releasing the registry lock (`spec.md` §5, I6: no framework call while
/// holding the lock) — real media-framework element handles are reference-counted wrappers, so
/// this is a cheap pointer clone, not a deep copy.
pub trait Element: Send + Clone {
    type Pad: Pad;

    /// The clip's output port, once it exists. `None` before the clip has finished whatever
    /// asynchronous initialization produces it (`spec.md` §4.7).
    fn output_pad(&self) -> Option<Self::Pad>;

    /// Drive this element's state in lockstep with the composition's own lifecycle (`spec.md`
    /// §4.6 step 10, §4.8).
    fn set_state(&self, state: ElementState);

    /// Send the given seek to this element's sink, e.g. after it becomes the new top of stack
    /// (`spec.md` §4.6 step 11, §4.7).
    fn send_seek(&self, seek: &SeekEvent);
}

/// `spec.md` §4.5/§7: a `SEGMENT_DONE` or seek event carries a time-format tag; only
/// `TimeUnit::Time` is honoured, anything else is logged and otherwise ignored.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TimeUnit {
    Time,
    Other,
}

/// Bitflags preserved verbatim on internal seeks (`spec.md` §4.4, §9's second Open Question).
/// `composure` does not interpret unknown bits, it only forwards them and can force its own.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct SeekFlags {
    bits: u32,
}
impl SeekFlags {
    const FLUSH: u32 = 1 << 0;
    const SEGMENT: u32 = 1 << 1;

    pub fn empty() -> Self {
        SeekFlags { bits: 0 }
    }
    pub fn from_bits(bits: u32) -> Self {
        SeekFlags { bits }
    }
    pub fn bits(&self) -> u32 {
        self.bits
    }
    pub fn flush(&self) -> bool {
        self.bits & Self::FLUSH != 0
    }
    pub fn segment(&self) -> bool {
        self.bits & Self::SEGMENT != 0
    }
    #[must_use]
    pub fn with_segment(mut self) -> Self {
        self.bits |= Self::SEGMENT;
        self
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SeekBound {
    None,
    Set(Time),
}
impl SeekBound {
    pub fn time(&self) -> Option<Time> {
        match self {
            SeekBound::None => None,
            SeekBound::Set(t) => Some(*t),
        }
    }
}

/// An external (or internal) seek event, mirroring `spec.md` §6's
/// `(rate, time-format, flags, start_type, start, stop_type, stop)` tuple.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SeekEvent {
    pub rate: f64,
    pub format: TimeUnit,
    pub flags: SeekFlags,
    pub start: SeekBound,
    pub stop: SeekBound,
}
impl SeekEvent {
    pub fn new(format: TimeUnit, start: Time, stop: Time, flags: SeekFlags) -> Self {
        SeekEvent {
            rate: 1.0,
            format,
            flags,
            start: SeekBound::Set(start),
            stop: SeekBound::Set(stop),
        }
    }
}

/// A caller-defined payload forwarded verbatim by the bus interceptor (`spec.md` §4.5: "any
/// other message: forward to the previously-installed observer").
pub trait OpaqueMessage: Send + Debug {}
impl<T: Send + Debug> OpaqueMessage for T {}

/// A message arriving on the downstream bus.
#[derive(Debug)]
pub enum Message<M: OpaqueMessage> {
    /// `spec.md` §4.5: a segment-completion notification, carrying the unit it was expressed in
    /// and the raw position (only meaningful when `unit == TimeUnit::Time`).
    SegmentDone { unit: TimeUnit, position: u64 },
    /// Anything the interceptor does not itself interpret.
    Other(M),
}

/// The single egress point the bus interceptor (`spec.md` §4.5) uses to forward messages it
/// does not consume, and to assert end-of-stream on the composition's output peer.
pub trait Bus<M: OpaqueMessage> {
    fn forward(&self, msg: Message<M>);
    fn post_eos(&self);
}
