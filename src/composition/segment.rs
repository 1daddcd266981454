//! Segment Controller (`spec.md` §4.4, C4): tracks the externally requested playback window and
//! the window of the currently wired stack, and decides when a rebuild is needed.

use crate::composition::clip::Time;
use crate::composition::framework::{SeekBound, SeekEvent, SeekFlags, TimeUnit};

/// The externally requested window + mode, and the window of the currently wired stack
/// (`spec.md` §3's `segment`, `segment_start`, `segment_stop`).
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SegmentState {
    pub segment: SeekEvent,
    pub segment_start: Time,
    pub segment_stop: Time,
}
impl Default for SegmentState {
    fn default() -> Self {
        SegmentState {
            segment: SeekEvent {
                rate: 1.0,
                format: TimeUnit::Time,
                flags: SeekFlags::empty(),
                start: SeekBound::Set(Time::ZERO),
                stop: SeekBound::None,
            },
            segment_start: Time::ZERO,
            segment_stop: Time::ZERO,
        }
    }
}
impl SegmentState {
    /// `spec.md` §4.4 `needs_rebuild`: seeked backward into a different window, or crossed
    /// forward out of the current one.
    pub fn needs_rebuild(&self) -> bool {
        let requested_start = self.segment.start.time().unwrap_or(Time::ZERO);
        requested_start < self.segment_start || requested_start >= self.segment_stop
    }

    /// `spec.md` §4.4 `handle_external_seek`: merge the incoming event into `segment`, clamping
    /// to the composition's own bounds. Returns the (already-clamped) requested start, which
    /// the caller passes to `update_pipeline` if `needs_rebuild()` ends up true.
    pub fn handle_external_seek(
        &mut self,
        evt: SeekEvent,
        composition_start: Time,
        composition_has_clips: bool,
        composition_stop: Time,
    ) {
        let clamped_start = match evt.start {
            SeekBound::Set(t) => SeekBound::Set(t.max(composition_start)),
            SeekBound::None => SeekBound::None,
        };
        let clamped_stop = match evt.stop {
            SeekBound::Set(t) if composition_has_clips => {
                SeekBound::Set(Time(t.0.min(composition_stop.0)))
            }
            other => other,
        };

        self.segment = SeekEvent {
            rate: evt.rate,
            format: evt.format,
            flags: evt.flags,
            start: clamped_start,
            stop: clamped_stop,
        };
    }

    /// `spec.md` §4.4 `build_internal_seek`: target `[max(segment.start, segment_start),
    /// min(segment.stop, segment_stop)]`. The `segment` flag is forced on `initial` builds (so
    /// downstream emits a segment-completion rather than an end-of-stream at `segment_stop`);
    /// otherwise the caller-supplied flags are preserved verbatim (`spec.md` §9).
    pub fn build_internal_seek(&self, initial: bool) -> SeekEvent {
        let start = self
            .segment
            .start
            .time()
            .unwrap_or(Time::ZERO)
            .max(self.segment_start);
        let stop = match self.segment.stop.time() {
            Some(t) => Time(t.0.min(self.segment_stop.0)),
            None => self.segment_stop,
        };

        let flags = if initial {
            self.segment.flags.with_segment()
        } else {
            self.segment.flags
        };

        SeekEvent {
            rate: self.segment.rate,
            format: self.segment.format,
            flags,
            start: SeekBound::Set(start),
            stop: SeekBound::Set(stop),
        }
    }
}
