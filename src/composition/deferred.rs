//! Deferred-Port Fix-up (`spec.md` §4.7, C7).
//!
//! Some elements only expose their output pad asynchronously, after the stack that needs them
//! has already been built. Rather than block `update_pipeline` on that, the registry records a
//! one-shot subscription and the facade retries the link once the host calls
//! [`notify_ready`] for that clip. A clip has at most one outstanding subscription at a time;
//! arming a new one (via [`subscribe`]) implicitly cancels whatever was there before, which
//! `Registry::arm_deferred_waiter` already guarantees.

use crate::composition::clip::ClipId;
use crate::composition::framework::Element;
use crate::composition::registry::Registry;

/// The result of asking whether `id` needs a deferred subscription right now.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Subscription {
    /// The element's output pad already exists; no subscription was needed.
    AlreadyReady,
    /// No port yet; a one-shot waiter was armed (replacing any prior one for `id`).
    Armed,
}

/// `spec.md` §4.7: called when `update_pipeline` wants to link `id` into the stack but finds
/// its port missing. Checks once more (the port may have arrived between resolve and link) and
/// either reports it is ready after all, or arms a waiter.
pub fn subscribe<E: Element>(registry: &mut Registry<E>, id: ClipId) -> Subscription {
    match registry.element(id).and_then(|e| e.output_pad()) {
        Some(_) => Subscription::AlreadyReady,
        None => {
            registry.arm_deferred_waiter(id);
            log::debug!("clip {id:?} port not ready, deferred-linking");
            Subscription::Armed
        }
    }
}

/// `notify_port_ready`: the host calls this once `id`'s element produces its output pad. Fires
/// only if a waiter is still outstanding and `id` is still present in the currently wired
/// stack — both the "cancel on new subscription" and "cancel on reset" rules (`spec.md` §4.7)
/// are enforced by whoever disarms the waiter before this is reached (see [`cancel`]), so this
/// function only has to check whether one is *still* armed.
pub fn notify_ready<E: Element>(
    registry: &mut Registry<E>,
    id: ClipId,
    current_stack: &[ClipId],
) -> bool {
    if !registry.has_deferred_waiter(id) {
        return false;
    }
    registry.disarm_deferred_waiter(id);
    let fires = current_stack.contains(&id);
    if fires {
        log::debug!("clip {id:?} port ready, completing deferred link");
    } else {
        log::debug!("clip {id:?} port ready but no longer in the wired stack, dropping");
    }
    fires
}

/// Cancel any outstanding subscription for `id`, e.g. because it left the wired stack on a
/// rebuild (`spec.md` §4.7's cancel-on-reset) or was removed from the registry entirely.
pub fn cancel<E: Element>(registry: &mut Registry<E>, id: ClipId) {
    registry.disarm_deferred_waiter(id);
}
