//! Render-time tracking for catch-up rendering.
//!
//! Tracks the emulated time up to which audio frames have been produced.
//! Register writes and audio callbacks both use this datum to decide how
//! many native ticks still need rendering.

/// Render clock for catch-up rendering
///
/// Time is measured in fractional milliseconds of emulated elapsed time.
/// One tick corresponds to one frame at the device's native render rate.
#[derive(Debug, Clone, Copy)]
pub struct RenderClock {
    /// Emulated time up to which frames have been rendered
    last_rendered_ms: f64,
    /// Duration of one native-rate frame
    ms_per_tick: f64,
}

impl RenderClock {
    /// Create a clock ticking at the given native render rate
    ///
    /// # Panics
    ///
    /// Panics if `tick_rate_hz` is not a positive rate.
    pub fn new(tick_rate_hz: f64) -> Self {
        assert!(tick_rate_hz > 0.0, "tick rate must be positive");
        RenderClock {
            last_rendered_ms: 0.0,
            ms_per_tick: 1000.0 / tick_rate_hz,
        }
    }

    /// Check whether rendered time still trails the given moment
    pub fn is_behind(&self, now_ms: f64) -> bool {
        self.last_rendered_ms < now_ms
    }

    /// Advance the rendered-time datum by exactly one tick
    pub fn advance_tick(&mut self) {
        self.last_rendered_ms += self.ms_per_tick;
    }

    /// Move the datum directly to the given moment
    ///
    /// Used when the audio callback has satisfied a pull (the consumer has
    /// caught up by construction) and when waking from idle, where the
    /// backlog is deliberately not replayed.
    pub fn reset_to(&mut self, now_ms: f64) {
        self.last_rendered_ms = now_ms;
    }

    /// Emulated time up to which frames have been rendered
    pub fn last_rendered_ms(&self) -> f64 {
        self.last_rendered_ms
    }

    /// Duration of one native-rate frame in milliseconds
    pub fn ms_per_tick(&self) -> f64 {
        self.ms_per_tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_catch_up_stops_within_one_tick() {
        // 1 kHz tick rate keeps the arithmetic easy to follow
        let mut clock = RenderClock::new(1000.0);
        let now = 5.25;

        let mut ticks = 0;
        while clock.is_behind(now) {
            clock.advance_tick();
            ticks += 1;
        }

        assert_eq!(ticks, 6);
        assert!(clock.last_rendered_ms() >= now);
        assert!(clock.last_rendered_ms() - now < clock.ms_per_tick());
    }

    #[test]
    fn test_no_op_when_current() {
        let mut clock = RenderClock::new(1000.0);
        clock.reset_to(10.0);
        assert!(!clock.is_behind(10.0));
        assert!(!clock.is_behind(9.0));
        assert_relative_eq!(clock.last_rendered_ms(), 10.0);
    }

    #[test]
    fn test_reset_discards_backlog() {
        let mut clock = RenderClock::new(1000.0);
        clock.reset_to(42.5);
        assert_relative_eq!(clock.last_rendered_ms(), 42.5);
        assert!(clock.is_behind(43.0));
    }
}
