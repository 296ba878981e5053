//! Frame clock: variable delta for movement, fixed steps for animation

use std::time::Instant;

/// Longest frame delta accepted; a stall beyond this doesn't teleport the camera
const MAX_DELTA: f64 = 0.25;

pub struct FrameClock {
    /// Seconds since the previous tick
    pub delta_time: f64,
    /// Interval of one animation step
    pub fixed_timestep: f64,
    accumulator: f64,
    last_instant: Option<Instant>,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::with_fixed_rate(60.0)
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixed_rate(hz: f64) -> Self {
        Self {
            delta_time: 0.0,
            fixed_timestep: 1.0 / hz,
            accumulator: 0.0,
            last_instant: None,
        }
    }

    /// Advance the clock. Call once per frame.
    pub fn tick(&mut self) {
        self.advance_to(Instant::now());
    }

    fn advance_to(&mut self, now: Instant) {
        let elapsed = match self.last_instant {
            // First tick: no time has passed yet
            None => 0.0,
            Some(last) => now.duration_since(last).as_secs_f64(),
        };
        self.last_instant = Some(now);
        self.delta_time = elapsed.min(MAX_DELTA);
        self.accumulator += self.delta_time;
    }

    /// Number of whole animation steps now due; consumes them
    pub fn take_fixed_steps(&mut self) -> u32 {
        let mut steps = 0;
        while self.accumulator >= self.fixed_timestep {
            self.accumulator -= self.fixed_timestep;
            steps += 1;
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_first_tick_zero_delta() {
        let mut clock = FrameClock::new();
        clock.tick();
        assert_eq!(clock.delta_time, 0.0);
        assert_eq!(clock.take_fixed_steps(), 0);
    }

    #[test]
    fn test_fixed_steps() {
        let mut clock = FrameClock::with_fixed_rate(60.0);
        let start = Instant::now();
        clock.advance_to(start);
        clock.advance_to(start + Duration::from_millis(40));
        assert!((clock.delta_time - 0.04).abs() < 1e-9);
        assert_eq!(clock.take_fixed_steps(), 2);
        assert_eq!(clock.take_fixed_steps(), 0);
    }

    #[test]
    fn test_delta_clamped() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.advance_to(start);
        clock.advance_to(start + Duration::from_secs(3));
        assert_eq!(clock.delta_time, MAX_DELTA);
    }
}
