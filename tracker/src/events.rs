//! In-core event channel for step attribution.
//!
//! A single publish channel (`step-created`) implemented as a plain callback
//! list on a shared dispatcher. MetaStep execution registers a temporary
//! listener that tags every step created during the call; the listener is
//! released through a [`Subscription`] drop guard so removal happens on every
//! exit path (success, error, or unwind). A leaked listener would
//! mis-attribute later unrelated steps to a stale MetaStep.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::step::Step;

type StepCallback = Rc<dyn Fn(&mut Step)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    step_created: Vec<(u64, StepCallback)>,
}

/// Shared, clonable handle to the callback registry.
///
/// Single-threaded by design; steps within a test execute sequentially.
#[derive(Clone, Default)]
pub struct Dispatcher {
    inner: Rc<RefCell<Registry>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a step-created listener. The listener stays active until the
    /// returned [`Subscription`] is dropped.
    pub fn on_step_created<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&mut Step) + 'static,
    {
        let mut registry = self.inner.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.step_created.push((id, Rc::new(callback)));
        Subscription {
            registry: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Invoke every active listener on a freshly created step, in
    /// registration order (outer MetaSteps first, so the innermost wins).
    pub fn emit_step_created(&self, step: &mut Step) {
        // Snapshot the callbacks so listeners cannot observe a borrowed
        // registry while they run.
        let callbacks: Vec<StepCallback> = self
            .inner
            .borrow()
            .step_created
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(step);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().step_created.len()
    }
}

/// Drop guard for a registered listener.
pub struct Subscription {
    registry: Weak<RefCell<Registry>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .borrow_mut()
                .step_created
                .retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::frame;

    fn step() -> Step {
        Step::new("click", vec![frame("Proxy.click", "login.js", 5, 3)])
    }

    #[test]
    fn listener_fires_while_subscription_is_held() {
        let dispatcher = Dispatcher::new();
        let _sub = dispatcher.on_step_created(|step| step.comment = "tagged".to_string());

        let mut step = step();
        dispatcher.emit_step_created(&mut step);
        assert_eq!(step.comment, "tagged");
    }

    #[test]
    fn dropping_subscription_removes_listener() {
        let dispatcher = Dispatcher::new();
        let sub = dispatcher.on_step_created(|step| step.comment = "tagged".to_string());
        assert_eq!(dispatcher.listener_count(), 1);

        drop(sub);
        assert_eq!(dispatcher.listener_count(), 0);

        let mut step = step();
        dispatcher.emit_step_created(&mut step);
        assert_eq!(step.comment, "");
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let dispatcher = Dispatcher::new();
        let _outer = dispatcher.on_step_created(|step| step.comment = "outer".to_string());
        let _inner = dispatcher.on_step_created(|step| step.comment = "inner".to_string());

        let mut step = step();
        dispatcher.emit_step_created(&mut step);
        assert_eq!(step.comment, "inner");
    }

    #[test]
    fn subscription_outliving_dispatcher_is_harmless() {
        let dispatcher = Dispatcher::new();
        let sub = dispatcher.on_step_created(|_| {});
        drop(dispatcher);
        drop(sub);
    }
}
