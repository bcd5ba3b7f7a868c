//! Fixed-timestep clock: produces simulation ticks at a steady rate and reports an
//! interpolation fraction for rendering between them, in the spirit of deWitters'
//! "fix your timestep" loop.

use std::time::{Duration, Instant};

use thiserror::Error;

/// Ticks are capped per wake-up to bound catch-up work after a long stall (e.g. the tab
/// was backgrounded), and a single wake-up's elapsed time is capped too so that stall
/// doesn't get "paid back" as a burst of simulation - the spiral of death.
const MAX_FRAME_DT: Duration = Duration::from_millis(250);
const MAX_TICKS_PER_FRAME: u32 = 5;

#[derive(Debug, Error)]
pub enum ClockError {
    #[error("clock is already stopped")]
    AlreadyStopped,
}

pub struct Clock {
    hz: u32,
    step: Duration,
    acc: Duration,
    last_wake: Option<Instant>,
    running: bool,
    ticks_run: u64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FrameAction {
    Tick,
    /// `alpha` is the render interpolation fraction acc/step, in [0, 1).
    Render { alpha: f64 },
}

/// Lazily drives ticks then yields a single render action, consuming `now` against the
/// clock's accumulator. Borrows the clock mutably for its lifetime.
pub struct FrameActions<'a> {
    clock: &'a mut Clock,
    ticks_this_frame: u32,
    rendered: bool,
}

impl Clock {
    pub fn new(hz: u32) -> Self {
        Self {
            hz,
            step: Self::step_for(hz),
            acc: Duration::ZERO,
            last_wake: None,
            running: false,
            ticks_run: 0,
        }
    }

    fn step_for(hz: u32) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(hz.max(1)))
    }

    /// Idempotent: starting an already-running clock resets nothing and is not an error.
    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.last_wake = None;
            self.acc = Duration::ZERO;
        }
    }

    pub fn stop(&mut self) -> Result<(), ClockError> {
        if !self.running {
            return Err(ClockError::AlreadyStopped);
        }
        self.running = false;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_target_rate(&mut self, hz: u32) {
        self.hz = hz;
        self.step = Self::step_for(hz);
    }

    pub fn target_rate(&self) -> u32 {
        self.hz
    }

    pub fn ticks_run(&self) -> u64 {
        self.ticks_run
    }

    /// Call once per wake-up (e.g. `requestAnimationFrame` callback). Accumulates wall
    /// time since the last call and returns an iterator of the ticks/render due this
    /// wake-up. A no-op (empty iterator) while stopped.
    pub fn begin_frame(&mut self, now: Instant) -> FrameActions<'_> {
        if self.running {
            let dt = match self.last_wake {
                Some(last) => now.saturating_duration_since(last).min(MAX_FRAME_DT),
                None => Duration::ZERO,
            };
            self.last_wake = Some(now);
            self.acc += dt;
        }

        FrameActions {
            clock: self,
            ticks_this_frame: 0,
            rendered: false,
        }
    }
}

impl<'a> Iterator for FrameActions<'a> {
    type Item = FrameAction;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.clock.running {
            return None;
        }

        if self.clock.acc >= self.clock.step && self.ticks_this_frame < MAX_TICKS_PER_FRAME {
            self.clock.acc -= self.clock.step;
            self.clock.ticks_run += 1;
            self.ticks_this_frame += 1;
            if self.ticks_this_frame == MAX_TICKS_PER_FRAME {
                // stall absorbed in this wake-up; don't let leftover full steps leak
                // into the next frame's accumulator as extra ticks.
                self.clock.acc = self.clock.acc.min(self.clock.step);
            }
            return Some(FrameAction::Tick);
        }

        if !self.rendered {
            self.rendered = true;
            let alpha = self.clock.acc.as_secs_f64() / self.clock.step.as_secs_f64();
            return Some(FrameAction::Render { alpha });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_is_idempotent() {
        let mut clock = Clock::new(60);
        clock.start();
        clock.start();
        assert!(clock.is_running());
    }

    #[test]
    fn stop_when_not_running_errors() {
        let mut clock = Clock::new(60);
        assert!(matches!(clock.stop(), Err(ClockError::AlreadyStopped)));
    }

    #[test]
    fn fixed_steps_at_exact_multiple() {
        let mut clock = Clock::new(50); // 20ms step
        clock.start();

        let t0 = Instant::now();
        // first frame establishes last_wake, no ticks yet
        let actions: Vec<_> = clock.begin_frame(t0).collect();
        assert_eq!(actions, vec![FrameAction::Render { alpha: 0.0 }]);

        let t1 = t0 + Duration::from_millis(100);
        let actions: Vec<_> = clock.begin_frame(t1).collect();
        let ticks = actions.iter().filter(|a| **a == FrameAction::Tick).count();
        assert_eq!(ticks, 5);
        assert_eq!(clock.ticks_run(), 5);
    }

    #[test]
    fn caps_ticks_per_frame_and_discards_residual() {
        let mut clock = Clock::new(100); // 10ms step
        clock.start();

        let t0 = Instant::now();
        clock.begin_frame(t0).for_each(drop);

        // huge stall: without the MAX_FRAME_DT clamp this would be 100 ticks
        let t1 = t0 + Duration::from_secs(1);
        let actions: Vec<_> = clock.begin_frame(t1).collect();
        let ticks = actions.iter().filter(|a| **a == FrameAction::Tick).count();
        assert_eq!(ticks, MAX_TICKS_PER_FRAME as usize);
        assert!(
            clock.acc <= clock.step,
            "residual beyond one step should be discarded once the tick cap is hit"
        );
    }

    #[test]
    fn stopped_clock_yields_nothing() {
        let mut clock = Clock::new(60);
        let actions: Vec<_> = clock.begin_frame(Instant::now()).collect();
        assert!(actions.is_empty());
    }

    #[test]
    fn set_target_rate_changes_step() {
        let mut clock = Clock::new(60);
        clock.set_target_rate(30);
        assert_eq!(clock.target_rate(), 30);
        assert_eq!(clock.step, Duration::from_secs_f64(1.0 / 30.0));
    }
}
