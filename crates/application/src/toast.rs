use std::time::{Duration, Instant};

pub const TOAST_DURATION: Duration = Duration::from_secs(3);

/// Short-lived status message. A new message replaces the current one and
/// restarts its timer.
#[derive(Debug, Clone, Default)]
pub struct Toast {
    message: Option<String>,
    hide_at: Option<Instant>,
}

impl Toast {
    pub fn trigger(&mut self, now: Instant, message: impl Into<String>) {
        self.message = Some(message.into());
        self.hide_at = Some(now + TOAST_DURATION);
    }

    pub fn tick(&mut self, now: Instant) {
        if self.hide_at.is_some_and(|at| at <= now) {
            self.message = None;
            self.hide_at = None;
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hides_after_duration() {
        let start = Instant::now();
        let mut toast = Toast::default();
        toast.trigger(start, "saved");
        toast.tick(start + Duration::from_millis(2999));
        assert_eq!(toast.message(), Some("saved"));
        toast.tick(start + TOAST_DURATION);
        assert_eq!(toast.message(), None);
    }

    #[test]
    fn retrigger_restarts_timer() {
        let start = Instant::now();
        let mut toast = Toast::default();
        toast.trigger(start, "first");
        toast.trigger(start + Duration::from_secs(2), "second");
        toast.tick(start + Duration::from_secs(4));
        assert_eq!(toast.message(), Some("second"));
        toast.tick(start + Duration::from_secs(5));
        assert_eq!(toast.message(), None);
    }
}
