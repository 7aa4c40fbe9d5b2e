//! Callback factories.
//!
//! Helpers that put a trigger in front of one or more callbacks, plus a
//! debounced callback built on the scheduler's `Debounce`.

use crate::triggers::{self, Trigger};
use alloc::rc::Rc;
use alloc::vec::Vec;
use lenskit_reactive::{callback, AttachEvent, Callback, Debounce, Lens, Scheduler, Stamp};

/// Runs `callbacks` in order when `trigger` is absent or accepts.
pub fn create_callback(trigger: Option<Trigger>, callbacks: Vec<Callback>) -> Callback {
    callback(move |event, lens| {
        let accepted = match &trigger {
            Some(trigger) => trigger(event, lens) == Some(true),
            None => true,
        };
        if accepted {
            for cb in &callbacks {
                cb(event, lens);
            }
        }
    })
}

/// Runs `callbacks` when the node's own value changed.
pub fn object(callbacks: Vec<Callback>) -> Callback {
    create_callback(Some(triggers::object()), callbacks)
}

/// Runs `callbacks` when the node was replaced.
pub fn strict(callbacks: Vec<Callback>) -> Callback {
    create_callback(Some(triggers::strict()), callbacks)
}

/// Runs `callbacks` when the node or an ancestor was replaced.
pub fn subtree(callbacks: Vec<Callback>) -> Callback {
    create_callback(Some(triggers::subtree()), callbacks)
}

/// Runs `callbacks` when the node lies on the path to a change.
pub fn on_path(callbacks: Vec<Callback>) -> Callback {
    create_callback(Some(triggers::on_path()), callbacks)
}

/// Delays `f` by `delay` ticks of `scheduler`; events arriving in the
/// meantime supersede the pending one.
pub fn debounce(f: Callback, scheduler: Rc<dyn Scheduler>, delay: u32) -> Callback {
    debounce_with(move |event, lens, _| f(event, lens), scheduler, delay)
}

/// Like `debounce`, handing the callback its `Stamp` so it can tell whether
/// a newer event arrived while it was running.
pub fn debounce_with<F>(f: F, scheduler: Rc<dyn Scheduler>, delay: u32) -> Callback
where
    F: Fn(&AttachEvent, &Lens, &Stamp) + 'static,
{
    let pool = Debounce::new(scheduler, delay);
    let f = Rc::new(f);
    callback(move |event, lens| {
        let f = Rc::clone(&f);
        let (event, lens) = (event.clone(), lens.clone());
        pool.run(move |stamp| f(&event, &lens, &stamp));
    })
}
