//! Bus Interceptor (`spec.md` §4.5, C5): looks at every message the downstream graph posts and
//! decides whether it is this crate's business or the host's.

use crate::composition::framework::{Bus, Message, OpaqueMessage, TimeUnit};

/// What the facade should do in response to an intercepted message.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BusAction {
    /// A `SEGMENT_DONE` arrived in `TimeUnit::Time` at this position; the facade should treat
    /// it as "time has reached here" and run `update_pipeline` if that crosses a boundary.
    Advance(u64),
    /// Nothing further to do; the message was either forwarded or dropped-with-a-log already.
    None,
}

/// `spec.md` §4.5: a `SEGMENT_DONE` in `TimeUnit::Time` is consumed and turned into an advance;
/// in any other unit it is dropped and logged (`BadFormat`, `spec.md` §7) rather than acted on.
/// Anything else is forwarded verbatim to the previously-installed observer.
pub fn intercept<M: OpaqueMessage, B: Bus<M>>(
    msg: Message<M>,
    bus: &B,
    log_bad_format: bool,
) -> BusAction {
    match msg {
        Message::SegmentDone {
            unit: TimeUnit::Time,
            position,
        } => BusAction::Advance(position),
        Message::SegmentDone { unit, position } => {
            if log_bad_format {
                log::warn!("ignoring SEGMENT_DONE at {position} in non-Time unit {unit:?}");
            }
            BusAction::None
        }
        Message::Other(m) => {
            bus.forward(Message::Other(m));
            BusAction::None
        }
    }
}
