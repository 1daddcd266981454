//! Stack Resolver (`spec.md` §4.2, C2): a pure function from a time point to an ordered stack.

use crate::composition::clip::{Clip, Priority, Time};
use crate::composition::registry::Registry;
use crate::composition::framework::Element;

/// `spec.md` §4.2 step 1-3: walk `by_start` while `start <= t`, keep the ones still active at
/// `t` (`stop > t`, `active`, `priority >= floor`), insert into priority order, and stop early
/// once a clip beyond `t` is seen or (once non-empty) a clip that has already ended is seen —
/// valid because `by_start` is ordered by `(start, priority)`, so no later clip with `start <=
/// t` could still appear after one that doesn't qualify.
pub fn resolve<E: Element>(registry: &Registry<E>, t: Time, floor: Priority) -> Vec<Clip> {
    let mut candidates: Vec<Clip> = Vec::new();

    for clip in registry.iter_by_start() {
        if clip.start > t {
            break;
        }
        if clip.stop <= t {
            if !candidates.is_empty() {
                break;
            }
            continue;
        }
        if !clip.active || clip.priority < floor {
            continue;
        }
        candidates.push(clip);
    }

    candidates.sort_by_key(|c| c.priority_key());
    candidates
}

/// `spec.md` §4.2 `get_clean_toplevel`: pop resolver candidates top-down until the running
/// "need" (initially 1, +arity per operation popped, -1 per pop) reaches zero or candidates run
/// out. `next_boundary` is the earliest `stop` among the clips actually kept.
pub fn get_clean_toplevel<E: Element>(
    registry: &Registry<E>,
    t: Time,
    floor: Priority,
) -> (Vec<Clip>, Time) {
    let candidates = resolve(registry, t, floor);

    let mut stack = Vec::new();
    let mut need: i64 = 1;

    for clip in candidates {
        if need == 0 {
            break;
        }
        need += i64::from(clip.kind.arity());
        need -= 1;
        stack.push(clip);
    }

    let next_boundary = stack
        .iter()
        .map(|c| c.stop)
        .min()
        .unwrap_or(Time::ZERO);

    (stack, next_boundary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::clip::ClipKind;
    use crate::composition::framework::ElementState;

    #[derive(Clone)]
    struct NullElement;
    impl Element for NullElement {
        type Pad = ();
        fn output_pad(&self) -> Option<()> {
            Some(())
        }
        fn set_state(&self, _state: ElementState) {}
        fn send_seek(&self, _seek: &crate::composition::framework::SeekEvent) {}
    }

    fn registry_with(
        clips: &[(Time, Time, Priority, bool, ClipKind)],
    ) -> Registry<NullElement> {
        let mut registry = Registry::new();
        for (start, stop, priority, active, kind) in clips.iter().copied() {
            registry
                .add(start, stop, priority, active, kind, NullElement)
                .unwrap();
        }
        registry
    }

    #[test]
    fn resolve_excludes_clips_outside_the_time_point() {
        let registry = registry_with(&[
            (Time(0), Time(500), Priority(0), true, ClipKind::Source),
            (Time(500), Time(1000), Priority(0), true, ClipKind::Source),
        ]);
        let stack = resolve(&registry, Time(250), Priority(0));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack[0].start, Time(0));
    }

    #[test]
    fn resolve_excludes_inactive_and_below_floor_clips() {
        let registry = registry_with(&[
            (Time(0), Time(1000), Priority(0), false, ClipKind::Source),
            (Time(0), Time(1000), Priority(5), true, ClipKind::Source),
        ]);
        assert!(resolve(&registry, Time(0), Priority(0)).is_empty());
        assert!(resolve(&registry, Time(0), Priority(5)).is_empty());
    }

    #[test]
    fn resolve_orders_overlapping_clips_by_priority_then_registration() {
        let registry = registry_with(&[
            (Time(0), Time(1000), Priority(2), true, ClipKind::Source),
            (Time(0), Time(1000), Priority(0), true, ClipKind::Source),
            (Time(0), Time(1000), Priority(0), true, ClipKind::Source),
        ]);
        let stack = resolve(&registry, Time(0), Priority(0));
        assert_eq!(stack.len(), 3);
        assert_eq!(stack[0].priority, Priority(0));
        assert_eq!(stack[1].priority, Priority(0));
        // Equal priority ties break by registration order (the second clip added, not the
        // third, comes first).
        assert!(stack[0].registration_seq < stack[1].registration_seq);
        assert_eq!(stack[2].priority, Priority(2));
    }

    #[test]
    fn toplevel_stops_consuming_once_arity_is_satisfied() {
        let registry = registry_with(&[
            (Time(0), Time(1000), Priority(0), true, ClipKind::Source),
            (Time(0), Time(1000), Priority(1), true, ClipKind::Source),
        ]);
        let (stack, next_boundary) = get_clean_toplevel(&registry, Time(0), Priority(0));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack[0].priority, Priority(0));
        assert_eq!(next_boundary, Time(1000));
    }

    #[test]
    fn toplevel_descends_through_operation_arity() {
        let registry = registry_with(&[
            (
                Time(0),
                Time(1000),
                Priority(0),
                true,
                ClipKind::Operation { arity: 2 },
            ),
            (Time(0), Time(1000), Priority(1), true, ClipKind::Source),
            (Time(0), Time(800), Priority(2), true, ClipKind::Source),
        ]);
        let (stack, next_boundary) = get_clean_toplevel(&registry, Time(0), Priority(0));
        assert_eq!(stack.len(), 3);
        assert_eq!(next_boundary, Time(800));
    }

    #[test]
    fn toplevel_of_empty_registry_is_empty() {
        let registry: Registry<NullElement> = Registry::new();
        let (stack, next_boundary) = get_clean_toplevel(&registry, Time(0), Priority(0));
        assert!(stack.is_empty());
        assert_eq!(next_boundary, Time::ZERO);
    }
}
