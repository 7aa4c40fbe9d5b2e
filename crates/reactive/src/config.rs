//! Lens tree configuration.

use crate::router::Adapter;
use crate::scheduler::{ManualScheduler, Scheduler};
use alloc::rc::Rc;

/// Options for building a lens tree.
///
/// ```rust
/// use lenskit_reactive::{create_lens_with, ImmediateScheduler, LensConfig};
/// use std::rc::Rc;
///
/// let config = LensConfig::new().with_scheduler(Rc::new(ImmediateScheduler::new()));
/// let lens = create_lens_with(1, config);
/// assert_eq!(lens.get().as_i64(), Some(1));
/// ```
#[derive(Clone, Default)]
pub struct LensConfig {
    scheduler: Option<Rc<dyn Scheduler>>,
    delay: u32,
    adapter: Adapter,
}

impl LensConfig {
    /// Creates the default configuration: a fresh `ManualScheduler`, no
    /// flush delay and the identity adapter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scheduler the transaction coordinator flushes on.
    pub fn with_scheduler(mut self, scheduler: Rc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Sets the flush delay in scheduler ticks.
    pub fn with_delay(mut self, delay: u32) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the root adapter.
    pub fn with_adapter(mut self, adapter: Adapter) -> Self {
        self.adapter = adapter;
        self
    }

    #[inline]
    pub fn delay(&self) -> u32 {
        self.delay
    }

    #[inline]
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// Returns the configured scheduler, or a fresh `ManualScheduler`.
    pub fn scheduler(&self) -> Rc<dyn Scheduler> {
        match &self.scheduler {
            Some(scheduler) => Rc::clone(scheduler),
            None => Rc::new(ManualScheduler::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ImmediateScheduler;

    #[test]
    fn test_config_defaults() {
        let config = LensConfig::new();
        assert_eq!(config.delay(), 0);
        assert!(config.adapter().is_identity());
        // every call without an explicit scheduler yields a new one
        assert!(!Rc::ptr_eq(&config.scheduler(), &config.scheduler()));
    }

    #[test]
    fn test_config_builder() {
        let scheduler: Rc<dyn Scheduler> = Rc::new(ImmediateScheduler::new());
        let config = LensConfig::new()
            .with_scheduler(scheduler.clone())
            .with_delay(4);

        assert_eq!(config.delay(), 4);
        assert!(Rc::ptr_eq(&config.scheduler(), &scheduler));
    }
}
