//! Public Facade & Lifecycle (`spec.md` §4.6, C6): the single type a host holds, wiring
//! together the registry (C1), resolver (C2), relink engine (C3), segment controller (C4), bus
//! interceptor (C5), and deferred-port fix-up (C7) into one `update_pipeline` rebuild routine.

use std::marker::PhantomData;
use std::sync::Mutex;

use crate::composition::bus::{self, BusAction};
use crate::composition::clip::{Clip, ClipId, ClipKind, Priority, Time};
use crate::composition::config::Config;
use crate::composition::deferred;
use crate::composition::error::{NotPresent, Rejected};
use crate::composition::framework::{Bus, Element, ElementState, Message, OpaqueMessage, SeekEvent};
use crate::composition::registry::Registry;
use crate::composition::relink::{relink_diff, TopChange};
use crate::composition::resolver::get_clean_toplevel;
use crate::composition::segment::SegmentState;

struct Inner<E: Element> {
    registry: Registry<E>,
    current_stack: Vec<Clip>,
    output_pad: Option<E::Pad>,
    state: ElementState,
    segment: SegmentState,
}
impl<E: Element> Inner<E> {
    fn new() -> Self {
        Inner {
            registry: Registry::new(),
            current_stack: Vec::new(),
            output_pad: None,
            state: ElementState::Null,
            segment: SegmentState::default(),
        }
    }
}

/// What caused this call to `update_pipeline`; determines which time the resolver runs at.
enum RebuildTrigger {
    /// A registry mutation (add, remove, or a property change) touched the currently wired
    /// window; re-resolve at the position the composition was already sitting at (`spec.md`
    /// §4.1's "time unknown" rebuild).
    PropertyChange,
    /// The host asked to move the playhead.
    ExternalSeek(SeekEvent),
    /// The downstream graph reported `SEGMENT_DONE` at this position.
    SegmentAdvance(Time),
    /// `spec.md` §4.8: the `ready -> paused` transition, which wires the composition for the
    /// first time at `composition.start` (`initial = true`, since `current_stack` is empty at
    /// that point whether this is the very first build or a reset one).
    LifecycleInitial,
}

/// The composition scheduler (`spec.md` §4.6). Owns one [`Registry`], the currently wired
/// stack, and the single output pad the host sees; `add`/`remove`/property-change methods and
/// the bus/seek entry points all funnel into [`Self::update_pipeline`].
pub struct Composition<E: Element, B: Bus<M>, M: OpaqueMessage> {
    inner: Mutex<Inner<E>>,
    bus: B,
    config: Config,
    _message: PhantomData<M>,
}

impl<E: Element, B: Bus<M>, M: OpaqueMessage> Composition<E, B, M> {
    pub fn new(bus: B, config: Config) -> Self {
        Composition {
            inner: Mutex::new(Inner::new()),
            bus,
            config,
            _message: PhantomData,
        }
    }

    /// `spec.md` §4.1 `add`. Registers the clip and, if it changed the composition's aggregate
    /// window or falls within the currently wired one, rebuilds.
    pub fn add(
        &self,
        start: Time,
        stop: Time,
        priority: Priority,
        active: bool,
        kind: ClipKind,
        element: E,
    ) -> Result<ClipId, Rejected> {
        let id = {
            let mut inner = self.inner.lock().unwrap();
            let (id, _change) = inner
                .registry
                .add(start, stop, priority, active, kind, element)?;
            id
        };
        self.update_pipeline(RebuildTrigger::PropertyChange);
        Ok(id)
    }

    /// `spec.md` §4.1 `remove`.
    pub fn remove(&self, id: ClipId) -> Result<(), NotPresent> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.registry.remove(id)?;
            deferred::cancel(&mut inner.registry, id);
        }
        self.update_pipeline(RebuildTrigger::PropertyChange);
        Ok(())
    }

    pub fn set_start(&self, id: ClipId, start: Time) -> Result<(), NotPresent> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.registry.set_start(id, start)?;
        }
        self.update_pipeline(RebuildTrigger::PropertyChange);
        Ok(())
    }

    pub fn set_stop(&self, id: ClipId, stop: Time) -> Result<(), NotPresent> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.registry.set_stop(id, stop)?;
        }
        self.update_pipeline(RebuildTrigger::PropertyChange);
        Ok(())
    }

    /// Changing `priority` can reorder the stack without moving either time bound, so — unlike
    /// `spec.md`'s description of `active` — it still needs a full rebuild (`SPEC_FULL.md`
    /// §4.1: "priority-only changes also need both [orderings] re-sorted").
    pub fn set_priority(&self, id: ClipId, priority: Priority) -> Result<(), NotPresent> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.registry.set_priority(id, priority)?;
        }
        self.update_pipeline(RebuildTrigger::PropertyChange);
        Ok(())
    }

    /// `spec.md` §4.1: flipping `active` alone never reorders either index, but can change
    /// whether the clip qualifies for the stack, so a rebuild still follows. Every mutating
    /// method here acquires `inner`'s lock, does its work, and releases it again before any
    /// `Element`/`Bus` call — so an `Element::set_state` callback that turns around and calls
    /// back into `set_active` for the same clip reacquires a lock nobody still holds, rather
    /// than re-entering this call's own critical section.
    pub fn set_active(&self, id: ClipId, active: bool) -> Result<(), NotPresent> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.registry.set_active(id, active)?;
        }
        self.update_pipeline(RebuildTrigger::PropertyChange);
        Ok(())
    }

    /// `spec.md` §4.6/§4.4: an externally requested seek. Clamped to the composition's bounds
    /// and only triggers a rebuild if it actually leaves the currently wired window.
    pub fn seek(&self, evt: SeekEvent) {
        self.update_pipeline(RebuildTrigger::ExternalSeek(evt));
    }

    /// Drive every element currently in the wired stack to `state`, remember it so the next
    /// rebuild starts newly-activated elements in the same state (`spec.md` §4.6 step 10), and
    /// handle the two lifecycle edges `spec.md` §4.8 calls out specifically:
    /// - `ready -> paused` wires the composition for the first time, at `composition.start`.
    /// - `paused -> ready` resets: drops `current_stack`, clears `segment_start`/`segment_stop`,
    ///   reinitialises `segment` to its defaults, detaches the output pad, and releases any
    ///   deferred-port subscription still outstanding for a clip that was in the old stack
    ///   (`spec.md` §5: "any pending deferred-port subscription must be released during reset").
    pub fn set_state(&self, state: ElementState) {
        let (driven_elements, needs_initial_build) = {
            let mut inner = self.inner.lock().unwrap();
            let old_state = inner.state;
            inner.state = state;

            let driven_elements: Vec<E> = inner
                .current_stack
                .iter()
                .filter_map(|c| inner.registry.element(c.id).cloned())
                .collect();

            let is_reset = old_state == ElementState::Paused && state == ElementState::Ready;
            let needs_initial_build =
                old_state == ElementState::Ready && state == ElementState::Paused;

            if is_reset {
                for clip in std::mem::take(&mut inner.current_stack) {
                    deferred::cancel(&mut inner.registry, clip.id);
                }
                inner.segment = SegmentState::default();
                inner.output_pad = None;
            }

            (driven_elements, needs_initial_build)
        };
        for element in driven_elements {
            element.set_state(state);
        }
        if needs_initial_build {
            self.update_pipeline(RebuildTrigger::LifecycleInitial);
        }
    }

    /// `spec.md` §4.5: feed a message observed on the downstream bus through the interceptor.
    pub fn on_message(&self, msg: Message<M>) {
        let action = bus::intercept(msg, &self.bus, self.config.log_bad_format);
        if let BusAction::Advance(position) = action {
            self.update_pipeline(RebuildTrigger::SegmentAdvance(Time(position)));
        }
    }

    /// `spec.md` §4.7 `notify_port_ready`: the host calls this once `id`'s element produces its
    /// output pad asynchronously. Only has an observable effect if `id` is still the wired
    /// stack's top and a subscription is still outstanding for it.
    pub fn notify_port_ready(&self, id: ClipId) {
        let (element, seek) = {
            let mut inner = self.inner.lock().unwrap();
            let current_ids: Vec<ClipId> = inner.current_stack.iter().map(|c| c.id).collect();
            if !deferred::notify_ready(&mut inner.registry, id, &current_ids) {
                return;
            }
            let is_top = inner.current_stack.first().map(|c| c.id) == Some(id);
            if !is_top {
                return;
            }
            let element = inner.registry.element(id).cloned();
            if let Some(pad) = element.as_ref().and_then(|e| e.output_pad()) {
                inner.output_pad = Some(pad);
            }
            let seek = inner.segment.build_internal_seek(false);
            (element, seek)
        };
        if let Some(element) = element {
            element.send_seek(&seek);
        }
    }

    pub fn output_pad(&self) -> Option<E::Pad> {
        self.inner.lock().unwrap().output_pad.clone()
    }

    pub fn state(&self) -> ElementState {
        self.inner.lock().unwrap().state
    }

    /// `spec.md` §4.6: the single rebuild routine, run under all of `add`/`remove`/property
    /// changes, `seek`, and a `SEGMENT_DONE` advance. Resolves the new stack, diffs it against
    /// the old one, updates registry-local state (output pad target, deferred waiters) while
    /// still holding the lock, then releases it before making any `Element`/`Bus` call — the
    /// structural enforcement of I6 (`spec.md` §5, `SPEC_FULL.md` §5).
    fn update_pipeline(&self, trigger: RebuildTrigger) {
        let is_segment_advance = matches!(trigger, RebuildTrigger::SegmentAdvance(_));

        let (deactivate, activate, top, internal_seek, became_empty) = {
            let mut inner = self.inner.lock().unwrap();

            // `spec.md` §4.6 step 3: a `PropertyChange` carries the "time unknown" sentinel —
            // by the time we get here the registry call that preceded this (`add`/`remove`/a
            // property setter) has already re-sorted its indices and recomputed the aggregate
            // `start`/`stop`, so while playing there is nothing left to do: release the lock and
            // return with the wiring untouched. The exception is while *not* playing, where a
            // rebuild is allowed to proceed immediately (e.g. so `add()` before the first
            // `ready -> paused` transition still wires a clip that already falls in range).
            let is_property_change = matches!(trigger, RebuildTrigger::PropertyChange);
            if is_property_change && inner.state == ElementState::Playing {
                return;
            }

            let t = match trigger {
                RebuildTrigger::PropertyChange => inner.segment.segment_start,
                RebuildTrigger::SegmentAdvance(position) => position,
                RebuildTrigger::LifecycleInitial => inner.registry.composition_start(),
                RebuildTrigger::ExternalSeek(evt) => {
                    inner.segment.handle_external_seek(
                        evt,
                        inner.registry.composition_start(),
                        !inner.registry.is_empty(),
                        inner.registry.composition_stop(),
                    );
                    if !inner.segment.needs_rebuild() {
                        return;
                    }
                    inner.segment.segment.start.time().unwrap_or(Time::ZERO)
                }
            };

            let initial = inner.current_stack.is_empty();
            let floor = self.config.priority_floor;
            let (new_stack, next_boundary) = get_clean_toplevel(&inner.registry, t, floor);

            let old_stack = std::mem::replace(&mut inner.current_stack, new_stack.clone());
            let diff = relink_diff(&old_stack, &new_stack);

            inner.segment.segment_start = t;
            inner.segment.segment_stop = next_boundary;

            log::debug!(
                "relink at {t:?}: {} unlink(s), {} link(s), {} deactivated, top={:?}",
                diff.unlinks.len(),
                diff.links.len(),
                diff.deactivate.len(),
                diff.top_change,
            );

            for id in &diff.deactivate {
                deferred::cancel(&mut inner.registry, *id);
            }

            let new_output_pad = match diff.top_change {
                TopChange::Unchanged => inner.output_pad.clone(),
                TopChange::Detach => None,
                TopChange::Retarget(id) => match deferred::subscribe(&mut inner.registry, id) {
                    deferred::Subscription::AlreadyReady => {
                        inner.registry.element(id).and_then(|e| e.output_pad())
                    }
                    // Port not ready yet: keep whatever the output pad previously targeted
                    // until `notify_port_ready` retargets it (`spec.md` §4.7).
                    deferred::Subscription::Armed => inner.output_pad.clone(),
                },
            };
            inner.output_pad = new_output_pad;

            let deactivate: Vec<E> = diff
                .deactivate
                .iter()
                .filter_map(|id| inner.registry.element(*id).cloned())
                .collect();
            let state = inner.state;
            let activate: Vec<E> = new_stack
                .iter()
                .filter_map(|c| inner.registry.element(c.id).cloned())
                .collect();
            let top = new_stack
                .first()
                .and_then(|c| inner.registry.element(c.id).cloned());
            let internal_seek = inner.segment.build_internal_seek(initial);
            let became_empty = new_stack.is_empty();

            (deactivate, (activate, state), top, internal_seek, became_empty)
        };

        for element in deactivate {
            element.set_state(ElementState::Null);
        }
        let (activate, state) = activate;
        for element in activate {
            element.set_state(state);
        }
        if let Some(top) = top {
            top.send_seek(&internal_seek);
        }
        // `spec.md` §4.5/§6: end-of-stream is asserted specifically "after a SEGMENT_DONE
        // rebuild" — a forward seek past the composition's end, or removing the last clip,
        // empties `current_stack` too but must not spuriously assert EOS.
        if became_empty && is_segment_advance {
            self.bus.post_eos();
        }
    }
}
