//! Object Registry (`spec.md` §4.1, C1).
//!
//! Owns the clip set, two time-ordered indices, and the per-clip bookkeeping the rest of the
//! crate needs (deferred-port subscription state, registration sequence). Pure data + index
//! maintenance: no framework calls happen here, so nothing in this module needs to care about
//! the "no framework call under lock" invariant (`spec.md` §5, I6) — that's the facade's job.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::composition::clip::{Clip, ClipId, ClipKind, Priority, RegistrationSeq, Time};
use crate::composition::error::{NotPresent, Rejected};
use crate::composition::framework::Element;
use crate::composition::utils::key_generator::KeyGenerator;

type StartKey = (Time, Priority, RegistrationSeq);
type StopKey = (Time, Priority, RegistrationSeq);

/// What a registry-visible operation changed, so the caller can decide what notifications and
/// rebuild ("time unknown", `spec.md` §4.1) to fire.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct AggregateChange {
    pub start_changed: bool,
    pub stop_changed: bool,
}
impl AggregateChange {
    pub fn any(&self) -> bool {
        self.start_changed || self.stop_changed
    }
}

struct Entry<E> {
    clip: Clip,
    element: E,
}

pub struct Registry<E: Element> {
    clips: HashMap<ClipId, Entry<E>>,
    by_start: BTreeSet<StartKey>,
    by_stop: BTreeSet<StopKey>,
    start_index: HashMap<StartKey, ClipId>,
    stop_index: HashMap<StopKey, ClipId>,

    key_generator: KeyGenerator<ClipId>,
    next_seq: u64,

    /// Clips with an outstanding deferred-port subscription (`spec.md` §4.7): a clip may have
    /// at most one at a time; registering a new one must first cancel the old.
    deferred_waiters: HashSet<ClipId>,

    composition_start: Time,
    composition_stop: Time,
}

impl<E: Element> Default for Registry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Element> Registry<E> {
    pub fn new() -> Self {
        Registry {
            clips: HashMap::new(),
            by_start: BTreeSet::new(),
            by_stop: BTreeSet::new(),
            start_index: HashMap::new(),
            stop_index: HashMap::new(),
            key_generator: KeyGenerator::new(),
            next_seq: 0,
            deferred_waiters: HashSet::new(),
            composition_start: Time::ZERO,
            composition_stop: Time::ZERO,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn composition_start(&self) -> Time {
        self.composition_start
    }

    pub fn composition_stop(&self) -> Time {
        self.composition_stop
    }

    pub fn composition_duration(&self) -> Time {
        self.composition_stop.saturating_sub(self.composition_start)
    }

    pub fn contains(&self, id: ClipId) -> bool {
        self.clips.contains_key(&id)
    }

    pub fn clip(&self, id: ClipId) -> Option<Clip> {
        self.clips.get(&id).map(|e| e.clip)
    }

    pub fn element(&self, id: ClipId) -> Option<&E> {
        self.clips.get(&id).map(|e| &e.element)
    }

    /// `spec.md` §4.1 `add`. Rejects a duplicate registration, a non-positive duration, or a
    /// zero-arity operation; otherwise inserts into both orderings and the hash index and
    /// recomputes the composition's aggregate `start`/`stop`.
    pub fn add(
        &mut self,
        start: Time,
        stop: Time,
        priority: Priority,
        active: bool,
        kind: ClipKind,
        element: E,
    ) -> Result<(ClipId, AggregateChange), Rejected> {
        if stop <= start {
            return Err(Rejected::NonPositiveDuration {
                start_ns: start.0,
                stop_ns: stop.0,
            });
        }
        if let ClipKind::Operation { arity: 0 } = kind {
            return Err(Rejected::ZeroArityOperation);
        }

        let id = self
            .key_generator
            .next()
            .expect("composition has more live clips than ClipId can address");
        let registration_seq = RegistrationSeq(self.next_seq);
        self.next_seq += 1;

        let clip = Clip {
            id,
            start,
            stop,
            priority,
            active,
            kind,
            registration_seq,
        };

        let start_key = clip.start_key();
        let stop_key = clip.stop_key();
        self.by_start.insert(start_key);
        self.by_stop.insert(stop_key);
        self.start_index.insert(start_key, id);
        self.stop_index.insert(stop_key, id);
        self.clips.insert(id, Entry { clip, element });

        let change = self.recompute_aggregates();
        Ok((id, change))
    }

    /// `spec.md` §4.1 `remove`.
    pub fn remove(&mut self, id: ClipId) -> Result<AggregateChange, NotPresent> {
        let entry = self.clips.remove(&id).ok_or(NotPresent(id))?;
        self.deferred_waiters.remove(&id);

        let start_key = entry.clip.start_key();
        let stop_key = entry.clip.stop_key();
        self.by_start.remove(&start_key);
        self.by_stop.remove(&stop_key);
        self.start_index.remove(&start_key);
        self.stop_index.remove(&stop_key);
        self.key_generator.free(id).expect("key was just in use");

        Ok(self.recompute_aggregates())
    }

    /// `spec.md` §4.1 `on_property_change`: re-sort the relevant ordering(s) and report whether
    /// the aggregate start/stop changed. `active` never requires a re-sort.
    pub fn set_start(&mut self, id: ClipId, start: Time) -> Result<AggregateChange, NotPresent> {
        if !self.clips.contains_key(&id) {
            return Err(NotPresent(id));
        }
        self.resort_start(id, |clip| clip.start = start);
        Ok(self.recompute_aggregates())
    }

    pub fn set_stop(&mut self, id: ClipId, stop: Time) -> Result<AggregateChange, NotPresent> {
        if !self.clips.contains_key(&id) {
            return Err(NotPresent(id));
        }
        self.resort_stop(id, |clip| clip.stop = stop);
        Ok(self.recompute_aggregates())
    }

    /// Priority affects the tie-break of both orderings, so both are re-sorted (`spec.md`
    /// §4.1: "priority-only changes also need both").
    pub fn set_priority(
        &mut self,
        id: ClipId,
        priority: Priority,
    ) -> Result<AggregateChange, NotPresent> {
        if !self.clips.contains_key(&id) {
            return Err(NotPresent(id));
        }
        self.resort_start(id, |clip| clip.priority = priority);
        self.resort_stop(id, |clip| clip.priority = priority);
        Ok(self.recompute_aggregates())
    }

    pub fn set_active(&mut self, id: ClipId, active: bool) -> Result<(), NotPresent> {
        let entry = self.clips.get_mut(&id).ok_or(NotPresent(id))?;
        entry.clip.active = active;
        Ok(())
    }

    fn resort_start(&mut self, id: ClipId, mutate: impl FnOnce(&mut Clip)) {
        let old_key = self.clips[&id].clip.start_key();
        self.by_start.remove(&old_key);
        self.start_index.remove(&old_key);

        let entry = self.clips.get_mut(&id).unwrap();
        mutate(&mut entry.clip);

        let new_key = entry.clip.start_key();
        self.by_start.insert(new_key);
        self.start_index.insert(new_key, id);
    }

    fn resort_stop(&mut self, id: ClipId, mutate: impl FnOnce(&mut Clip)) {
        let old_key = self.clips[&id].clip.stop_key();
        self.by_stop.remove(&old_key);
        self.stop_index.remove(&old_key);

        let entry = self.clips.get_mut(&id).unwrap();
        mutate(&mut entry.clip);

        let new_key = entry.clip.stop_key();
        self.by_stop.insert(new_key);
        self.stop_index.insert(new_key, id);
    }

    fn recompute_aggregates(&mut self) -> AggregateChange {
        let (new_start, new_stop) = if self.clips.is_empty() {
            (Time::ZERO, Time::ZERO)
        } else {
            let start = self.by_start.iter().next().map(|(t, _, _)| *t).unwrap();
            let stop = self.by_stop.iter().next_back().map(|(t, _, _)| *t).unwrap();
            (start, stop)
        };

        let change = AggregateChange {
            start_changed: new_start != self.composition_start,
            stop_changed: new_stop != self.composition_stop,
        };
        self.composition_start = new_start;
        self.composition_stop = new_stop;
        change
    }

    /// Iterate clips ordered by `(start, priority, registration_seq)`, ascending.
    pub fn iter_by_start(&self) -> impl Iterator<Item = Clip> + '_ {
        self.by_start
            .iter()
            .map(move |key| self.clips[&self.start_index[key]].clip)
    }

    /// Register a deferred-port waiter for `id`, cancelling any previous one first (`spec.md`
    /// §4.7: "adding a new one must first cancel the old"). Returns whether one was already
    /// outstanding.
    pub fn arm_deferred_waiter(&mut self, id: ClipId) -> bool {
        self.deferred_waiters.insert(id)
    }

    pub fn has_deferred_waiter(&self, id: ClipId) -> bool {
        self.deferred_waiters.contains(&id)
    }

    pub fn disarm_deferred_waiter(&mut self, id: ClipId) {
        self.deferred_waiters.remove(&id);
    }

    /// I1/I2 (`spec.md` §8): the two orderings and the hash index agree on membership and sort.
    #[cfg(any(test, debug_assertions))]
    pub fn check_invariants(&self) {
        assert_eq!(self.by_start.len(), self.clips.len());
        assert_eq!(self.by_stop.len(), self.clips.len());
        assert_eq!(self.start_index.len(), self.clips.len());
        assert_eq!(self.stop_index.len(), self.clips.len());

        let mut prev: Option<StartKey> = None;
        for key in &self.by_start {
            if let Some(p) = prev {
                assert!(p <= *key, "by_start is not sorted at {key:?}");
            }
            prev = Some(*key);
            assert!(self.clips.contains_key(&self.start_index[key]));
        }

        let mut prev: Option<StopKey> = None;
        for key in &self.by_stop {
            if let Some(p) = prev {
                assert!(p <= *key, "by_stop is not sorted at {key:?}");
            }
            prev = Some(*key);
            assert!(self.clips.contains_key(&self.stop_index[key]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::framework::ElementState;

    #[derive(Clone)]
    struct NullElement;
    impl Element for NullElement {
        type Pad = ();
        fn output_pad(&self) -> Option<()> {
            None
        }
        fn set_state(&self, _state: ElementState) {}
        fn send_seek(&self, _seek: &crate::composition::framework::SeekEvent) {}
    }

    #[test]
    fn add_rejects_non_positive_duration() {
        let mut registry = Registry::new();
        let err = registry
            .add(
                Time(100),
                Time(100),
                Priority(0),
                true,
                ClipKind::Source,
                NullElement,
            )
            .unwrap_err();
        assert_eq!(
            err,
            Rejected::NonPositiveDuration {
                start_ns: 100,
                stop_ns: 100
            }
        );
    }

    #[test]
    fn add_rejects_zero_arity_operation() {
        let mut registry = Registry::new();
        let err = registry
            .add(
                Time(0),
                Time(100),
                Priority(0),
                true,
                ClipKind::Operation { arity: 0 },
                NullElement,
            )
            .unwrap_err();
        assert_eq!(err, Rejected::ZeroArityOperation);
    }

    #[test]
    fn aggregate_window_tracks_min_start_and_max_stop() {
        let mut registry = Registry::new();
        registry
            .add(
                Time(100),
                Time(500),
                Priority(0),
                true,
                ClipKind::Source,
                NullElement,
            )
            .unwrap();
        assert_eq!(registry.composition_start(), Time(100));
        assert_eq!(registry.composition_stop(), Time(500));

        let (id2, change) = registry
            .add(
                Time(0),
                Time(1000),
                Priority(0),
                true,
                ClipKind::Source,
                NullElement,
            )
            .unwrap();
        assert!(change.start_changed);
        assert!(change.stop_changed);
        assert_eq!(registry.composition_start(), Time::ZERO);
        assert_eq!(registry.composition_stop(), Time(1000));

        let change = registry.remove(id2).unwrap();
        assert!(change.start_changed);
        assert!(change.stop_changed);
        assert_eq!(registry.composition_start(), Time(100));
        assert_eq!(registry.composition_stop(), Time(500));

        registry.check_invariants();
    }

    #[test]
    fn remove_of_unknown_id_is_not_present() {
        let mut registry: Registry<NullElement> = Registry::new();
        let bogus = registry
            .add(
                Time(0),
                Time(1),
                Priority(0),
                true,
                ClipKind::Source,
                NullElement,
            )
            .unwrap()
            .0;
        registry.remove(bogus).unwrap();
        assert_eq!(registry.remove(bogus).unwrap_err(), NotPresent(bogus));
    }

    #[test]
    fn set_priority_resorts_both_indices() {
        let mut registry = Registry::new();
        let (a, _) = registry
            .add(
                Time(0),
                Time(1000),
                Priority(5),
                true,
                ClipKind::Source,
                NullElement,
            )
            .unwrap();
        registry.set_priority(a, Priority(1)).unwrap();
        assert_eq!(registry.clip(a).unwrap().priority, Priority(1));
        registry.check_invariants();
    }

    #[test]
    fn deferred_waiter_arming_replaces_any_prior_one() {
        let mut registry: Registry<NullElement> = Registry::new();
        let (a, _) = registry
            .add(
                Time(0),
                Time(1000),
                Priority(0),
                true,
                ClipKind::Source,
                NullElement,
            )
            .unwrap();
        assert!(!registry.has_deferred_waiter(a));
        registry.arm_deferred_waiter(a);
        assert!(registry.has_deferred_waiter(a));
        registry.arm_deferred_waiter(a);
        assert!(registry.has_deferred_waiter(a));
        registry.disarm_deferred_waiter(a);
        assert!(!registry.has_deferred_waiter(a));
    }
}
