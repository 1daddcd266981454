//! Relink Engine (`spec.md` §4.3, C3): diff an old stack against a new one into the minimum
//! set of link/unlink operations, a deactivate set, and a top-of-stack change.

use std::collections::HashSet;

use crate::composition::clip::{Clip, ClipId};

/// The non-top end of a link/unlink: either another clip in the stack, or the composition's
/// own external output port.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Endpoint {
    External,
    Clip(ClipId),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Unlink {
    pub from: Endpoint,
    pub to: ClipId,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Link {
    pub from: Endpoint,
    pub to: ClipId,
}

/// Whether the external output port needs to move to a new clip's pad.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TopChange {
    Unchanged,
    Retarget(ClipId),
    /// The new stack is empty; the output port should be detached (`SPEC_FULL.md` §9's
    /// empty-composition short-circuit).
    Detach,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct RelinkDiff {
    pub unlinks: Vec<Unlink>,
    pub links: Vec<Link>,
    pub deactivate: HashSet<ClipId>,
    pub top_change: TopChange,
}
impl Default for TopChange {
    fn default() -> Self {
        TopChange::Unchanged
    }
}

/// `spec.md` §4.3. `old_stack` and `new_stack` are both top-to-bottom ordered.
pub fn relink_diff(old_stack: &[Clip], new_stack: &[Clip]) -> RelinkDiff {
    let mut unlinks = Vec::new();
    let mut links = Vec::new();
    let mut deactivate = HashSet::new();

    let mut prev_old: Option<ClipId> = None;
    let mut prev_new: Option<ClipId> = None;

    let common_len = old_stack.len().min(new_stack.len());
    for i in 0..common_len {
        let o = old_stack[i];
        let n = new_stack[i];

        if o.id != n.id {
            deactivate.insert(o.id);
            if let Some(po) = prev_old {
                unlinks.push(Unlink {
                    from: Endpoint::Clip(po),
                    to: o.id,
                });
            }
            if let Some(pn) = prev_new {
                links.push(Link {
                    from: Endpoint::Clip(pn),
                    to: n.id,
                });
            }
            // else: no previous-new means n is the new top; the top-of-stack retarget
            // (computed below via `top_change`) covers this case, not an explicit link op.
        }
        // o == n: an unchanged clip (operation or source) keeps whatever links it already has;
        // nothing to emit. Either way it becomes the new "previous" for the next position.

        prev_old = Some(o.id);
        prev_new = Some(n.id);
    }

    // Remaining tail of new_stack: entirely new entries, cascade-linked to one another.
    for n in &new_stack[common_len..] {
        match prev_new {
            Some(pn) => links.push(Link {
                from: Endpoint::Clip(pn),
                to: n.id,
            }),
            None => {} // covered by top_change
        }
        prev_new = Some(n.id);
    }

    // Remaining tail of old_stack: entirely vacated entries, cascade-unlinked and deactivated.
    for o in &old_stack[common_len..] {
        deactivate.insert(o.id);
        if let Some(po) = prev_old {
            unlinks.push(Unlink {
                from: Endpoint::Clip(po),
                to: o.id,
            });
        }
        prev_old = Some(o.id);
    }

    // Final pass (`spec.md` §4.3 step 3): a clip present in both stacks (e.g. reordered by a
    // priority-only change) is never deactivated, even if it showed up as a mismatch above.
    let new_ids: HashSet<ClipId> = new_stack.iter().map(|c| c.id).collect();
    deactivate.retain(|id| !new_ids.contains(id));

    let top_change = match (old_stack.first(), new_stack.first()) {
        (_, None) => TopChange::Detach,
        (Some(old_top), Some(new_top)) if old_top.id == new_top.id => TopChange::Unchanged,
        (_, Some(new_top)) => TopChange::Retarget(new_top.id),
    };

    RelinkDiff {
        unlinks,
        links,
        deactivate,
        top_change,
    }
}
