//! Transient "jump to source" emphasis
//!
//! After a reverse navigation one highlight is shown as active for a fixed
//! time. The deadline is a plain `Instant` checked on every tick, and the
//! clock is injected so tests never sleep.

use std::rc::Rc;
use std::time::{Duration, Instant};

use log::debug;

use crate::settings;

/// Monotonic time source
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEmphasis {
    pub highlight_id: String,
    pub expires_at: Instant,
}

impl ActiveEmphasis {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// One per document-viewing context. Re-arming replaces the running
/// emphasis instead of stacking a second one.
#[derive(Debug)]
pub struct EmphasisTimer<C: Clock = SystemClock> {
    clock: C,
    duration: Duration,
    active: Option<ActiveEmphasis>,
}

impl EmphasisTimer<SystemClock> {
    pub fn with_system_clock(duration: Duration) -> Self {
        Self::new(SystemClock, duration)
    }
}

impl<C: Clock> EmphasisTimer<C> {
    pub const DEFAULT_DURATION: Duration = Duration::from_millis(3000);

    pub fn new(clock: C, duration: Duration) -> Self {
        Self {
            clock,
            duration,
            active: None,
        }
    }

    /// Timer using the configured emphasis duration
    pub fn from_settings(clock: C) -> Self {
        let ms = settings::current().emphasis_duration_ms;
        Self::new(clock, Duration::from_millis(ms))
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Emphasize `highlight_id`, restarting the countdown
    pub fn arm(&mut self, highlight_id: impl Into<String>) -> &ActiveEmphasis {
        let highlight_id = highlight_id.into();
        if let Some(previous) = &self.active {
            debug!(
                "Emphasis on {} replaced by {highlight_id}",
                previous.highlight_id
            );
        }
        self.active.insert(ActiveEmphasis {
            highlight_id,
            expires_at: self.clock.now() + self.duration,
        })
    }

    /// Clear an expired emphasis. Returns true when something was cleared.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now();
        match &self.active {
            Some(active) if active.is_expired(now) => {
                debug!("Emphasis on {} expired", active.highlight_id);
                self.active = None;
                true
            }
            _ => false,
        }
    }

    /// The live emphasis; an expired one reads as absent even before `tick`
    pub fn active(&self) -> Option<&ActiveEmphasis> {
        let now = self.clock.now();
        self.active.as_ref().filter(|a| !a.is_expired(now))
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active().map(|a| a.highlight_id.as_str())
    }

    pub fn time_remaining(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.active()
            .map(|a| a.expires_at.saturating_duration_since(now))
    }

    pub fn clear(&mut self) {
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::ManualClock;

    fn timer(clock: &ManualClock) -> EmphasisTimer<&ManualClock> {
        EmphasisTimer::new(clock, Duration::from_millis(3000))
    }

    #[test]
    fn active_until_deadline() {
        let clock = ManualClock::new();
        let mut t = timer(&clock);
        t.arm("h1");

        clock.set_elapsed(Duration::from_millis(2999));
        assert!(!t.tick());
        assert_eq!(t.active_id(), Some("h1"));

        clock.set_elapsed(Duration::from_millis(3001));
        assert!(t.tick());
        assert_eq!(t.active_id(), None);
    }

    #[test]
    fn expired_reads_as_absent_before_tick() {
        let clock = ManualClock::new();
        let mut t = timer(&clock);
        t.arm("h1");
        clock.advance(Duration::from_secs(4));
        assert!(t.active().is_none());
    }

    #[test]
    fn rearm_resets_deadline() {
        let clock = ManualClock::new();
        let mut t = timer(&clock);
        t.arm("h1");
        clock.advance(Duration::from_millis(2000));
        t.arm("h2");
        clock.advance(Duration::from_millis(2000));
        assert!(!t.tick());
        assert_eq!(t.active_id(), Some("h2"));
        assert_eq!(t.time_remaining(), Some(Duration::from_millis(1000)));
        clock.advance(Duration::from_millis(1000));
        assert!(t.tick());
    }

    #[test]
    fn tick_without_emphasis_is_noop() {
        let clock = ManualClock::new();
        let mut t = timer(&clock);
        assert!(!t.tick());
        assert!(t.time_remaining().is_none());
    }
}
