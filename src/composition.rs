//! The composition scheduler: resolves which clips are active at any instant, wires them into a
//! priority-ordered stack, and keeps that stack coherent across time, seeks, and edits.

mod bus;
pub mod clip;
pub mod config;
mod composition;
mod deferred;
pub mod error;
pub mod framework;
mod registry;
mod relink;
mod resolver;
mod segment;
mod utils;

pub use clip::{Clip, ClipId, ClipKind, Priority, RegistrationSeq, Time};
pub use composition::Composition;
pub use config::{Config, TieBreak};
pub use error::{NotPresent, Rejected};
pub use framework::{
    Bus, Element, ElementState, Message, OpaqueMessage, Pad, SeekBound, SeekEvent, SeekFlags,
    TimeUnit,
};
