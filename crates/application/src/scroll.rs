use std::rc::Rc;
use std::time::{Duration, Instant};

use duoread_core::ScrollMetrics;
use duoread_storage::{LocalStore, SCROLL_POSITION_KEY};

use crate::debounce::Debouncer;

pub const PROGRESS_DEBOUNCE: Duration = Duration::from_millis(50);
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(200);
/// Time given to freshly loaded content to lay out before reading its geometry.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollTo(pub u32);

/// Reading progress and scroll-position persistence, both fed by the same
/// scroll events.
pub struct ScrollTracker {
    store: Rc<dyn LocalStore>,
    active: bool,
    progress: f32,
    progress_debounce: Debouncer<ScrollMetrics>,
    save_debounce: Debouncer<u32>,
    recompute_at: Option<Instant>,
    restore_at: Option<Instant>,
}

impl std::fmt::Debug for ScrollTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollTracker")
            .field("active", &self.active)
            .field("progress", &self.progress)
            .field("recompute_at", &self.recompute_at)
            .field("restore_at", &self.restore_at)
            .finish_non_exhaustive()
    }
}

impl ScrollTracker {
    pub fn new(store: Rc<dyn LocalStore>) -> Self {
        Self {
            store,
            active: false,
            progress: 0.0,
            progress_debounce: Debouncer::new(PROGRESS_DEBOUNCE),
            save_debounce: Debouncer::new(SAVE_DEBOUNCE),
            recompute_at: None,
            restore_at: None,
        }
    }

    /// Starts listening: computes progress once and schedules the restore of
    /// the saved offset after the settle delay.
    pub fn activate(&mut self, now: Instant, metrics: ScrollMetrics, article_loaded: bool) {
        self.active = true;
        self.recompute(metrics, article_loaded);
        self.restore_at = Some(now + SETTLE_DELAY);
    }

    /// Stops listening and drops every pending timer.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.progress_debounce.cancel();
        self.save_debounce.cancel();
        self.recompute_at = None;
        self.restore_at = None;
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn on_scroll(&mut self, now: Instant, metrics: ScrollMetrics) {
        if !self.active {
            return;
        }
        self.progress_debounce.call(now, metrics);
        self.save_debounce.call(now, metrics.scroll_top);
    }

    pub fn on_resize(&mut self, now: Instant, metrics: ScrollMetrics) {
        if !self.active {
            return;
        }
        self.progress_debounce.call(now, metrics);
    }

    pub fn on_article_loaded(&mut self, now: Instant) {
        if self.active {
            self.recompute_at = Some(now + SETTLE_DELAY);
        }
    }

    /// Runs whatever is due at `now`. `metrics` is the current geometry, used
    /// by the post-load recompute; debounced work uses the geometry of its
    /// last event.
    pub fn tick(
        &mut self,
        now: Instant,
        metrics: ScrollMetrics,
        article_loaded: bool,
    ) -> Option<ScrollTo> {
        if !self.active {
            return None;
        }

        if let Some(last) = self.progress_debounce.fire(now) {
            self.recompute(last, article_loaded);
        }

        if self.recompute_at.is_some_and(|at| at <= now) {
            self.recompute_at = None;
            self.recompute(metrics, article_loaded);
        }

        if let Some(offset) = self.save_debounce.fire(now)
            && article_loaded
        {
            self.save_position(offset);
        }

        if self.restore_at.is_some_and(|at| at <= now) {
            self.restore_at = None;
            return self.saved_position().map(ScrollTo);
        }
        None
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.progress_debounce.deadline(),
            self.save_debounce.deadline(),
            self.recompute_at,
            self.restore_at,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn recompute(&mut self, metrics: ScrollMetrics, article_loaded: bool) {
        self.progress = if article_loaded {
            metrics.percent()
        } else {
            0.0
        };
    }

    fn save_position(&self, offset: u32) {
        if let Err(err) = self
            .store
            .set_item(SCROLL_POSITION_KEY, &offset.to_string())
        {
            tracing::warn!(error = %format!("{err:#}"), "failed to save scroll position");
        }
    }

    fn saved_position(&self) -> Option<u32> {
        let raw = match self.store.get_item(SCROLL_POSITION_KEY) {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "failed to read scroll position");
                return None;
            }
        };
        match raw.trim().parse::<u32>() {
            Ok(offset) => Some(offset),
            Err(_) => {
                tracing::warn!(value = %raw, "ignoring unreadable scroll position");
                None
            }
        }
    }
}
