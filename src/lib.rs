//! `composure`: the scheduling core of a non-linear media composition engine.
//!
//! Resolves, at any playback instant, which time-ranged clips are active, wires them into a
//! priority-ordered processing stack, and keeps that stack coherent as time advances, as seeks
//! occur, and as clips are added, removed, or re-timed. The underlying media graph itself — the
//! elements a clip wraps, their pads, and the bus they post messages on — is represented only by
//! the [`composition::Element`], [`composition::Bus`], and related traits; a host supplies the
//! concrete implementations.

mod composition;

pub use composition::{
    Bus, Clip, ClipId, ClipKind, Composition, Config, Element, ElementState, Message,
    NotPresent, OpaqueMessage, Pad, Priority, Rejected, RegistrationSeq, SeekBound, SeekEvent,
    SeekFlags, TieBreak, Time, TimeUnit,
};
