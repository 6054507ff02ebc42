use crate::types::{Params, BEAT_IDLE};
use crossbeam_channel::{never, tick, Receiver};
use log::debug;
use std::time::{Duration, Instant};

/// Time between beats at `bpm`, in whole milliseconds.
pub fn interval_for(bpm: u32) -> Duration {
    let bpm = Params::clamp_bpm(bpm as i64);
    Duration::from_millis(60_000 / bpm as u64)
}

/// Beat counter driven by a cancellable periodic schedule.
///
/// While running, the schedule is a `crossbeam_channel::tick` receiver. The
/// first tick arrives one full interval after the schedule is created, never
/// at creation. Replacing or dropping the receiver cancels the schedule along
/// with any tick already queued in it.
pub struct BeatTimer {
    bpm: u32,
    beat: i64,
    schedule: Option<Receiver<Instant>>,
    idle: Receiver<Instant>,
}

impl BeatTimer {
    pub fn new(bpm: u32) -> Self {
        Self {
            bpm: Params::clamp_bpm(bpm as i64),
            beat: BEAT_IDLE,
            schedule: None,
            idle: never(),
        }
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn beat(&self) -> i64 {
        self.beat
    }

    pub fn is_running(&self) -> bool {
        self.schedule.is_some()
    }

    pub fn interval(&self) -> Duration {
        interval_for(self.bpm)
    }

    pub fn set_running(&mut self, running: bool) {
        match (running, self.is_running()) {
            (true, false) => {
                self.beat = BEAT_IDLE;
                self.schedule = Some(tick(self.interval()));
                debug!("Timer scheduled every {:?}", self.interval());
            }
            (false, true) => {
                self.schedule = None;
                self.beat = BEAT_IDLE;
                debug!("Timer cancelled");
            }
            _ => {}
        }
    }

    /// Change tempo. A running schedule is replaced immediately and any
    /// partially elapsed interval is discarded.
    pub fn set_bpm(&mut self, bpm: u32) {
        let bpm = Params::clamp_bpm(bpm as i64);
        if bpm == self.bpm {
            return;
        }
        self.bpm = bpm;
        if self.is_running() {
            self.schedule = Some(tick(self.interval()));
            debug!("Timer rescheduled every {:?}", self.interval());
        }
    }

    /// Receiver that yields on every tick. Never yields while stopped.
    pub fn ticks(&self) -> Receiver<Instant> {
        self.schedule.as_ref().unwrap_or(&self.idle).clone()
    }

    /// Count one tick. Does nothing while stopped.
    pub fn advance(&mut self) -> i64 {
        if self.is_running() {
            self.beat += 1;
        }
        self.beat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_math() {
        assert_eq!(interval_for(60), Duration::from_millis(1000));
        assert_eq!(interval_for(40), Duration::from_millis(1500));
        assert_eq!(interval_for(120), Duration::from_millis(500));
        assert_eq!(interval_for(180), Duration::from_millis(333));
        // Out-of-range tempos are clamped before dividing.
        assert_eq!(interval_for(0), Duration::from_millis(1500));
        assert_eq!(interval_for(1000), Duration::from_millis(333));
    }

    #[test]
    fn test_stopped_timer_is_pinned() {
        let mut t = BeatTimer::new(120);
        assert!(!t.is_running());
        assert_eq!(t.beat(), BEAT_IDLE);
        assert_eq!(t.advance(), BEAT_IDLE);
        assert!(t.ticks().try_recv().is_err());
    }

    #[test]
    fn test_counts_from_zero_and_resets_on_stop() {
        let mut t = BeatTimer::new(120);
        t.set_running(true);
        assert_eq!(t.beat(), BEAT_IDLE, "no beat on activation itself");
        assert_eq!(t.advance(), 0);
        assert_eq!(t.advance(), 1);
        assert_eq!(t.advance(), 2);

        t.set_running(false);
        assert_eq!(t.beat(), BEAT_IDLE);

        t.set_running(true);
        assert_eq!(t.advance(), 0, "count does not persist across stop/start");
    }

    #[test]
    fn test_start_while_running_keeps_count() {
        let mut t = BeatTimer::new(120);
        t.set_running(true);
        t.advance();
        t.advance();
        t.set_running(true);
        assert_eq!(t.beat(), 1);
    }

    #[test]
    fn test_bpm_change_keeps_count() {
        let mut t = BeatTimer::new(40);
        t.set_running(true);
        t.advance();
        t.set_bpm(180);
        assert_eq!(t.bpm(), 180);
        assert_eq!(t.beat(), 0);
        assert_eq!(t.interval(), Duration::from_millis(333));
    }

    #[test]
    fn test_no_tick_before_first_interval() {
        let mut t = BeatTimer::new(180);
        t.set_running(true);
        let ticks = t.ticks();
        assert!(ticks.try_recv().is_err());
        assert!(ticks.recv_timeout(Duration::from_millis(250)).is_err());
        assert!(ticks.recv_timeout(Duration::from_millis(500)).is_ok());
    }

    #[test]
    fn test_stop_discards_pending_tick() {
        let mut t = BeatTimer::new(180);
        t.set_running(true);
        std::thread::sleep(Duration::from_millis(400));
        // A tick is now due on the old schedule; stopping must drop it.
        t.set_running(false);
        assert!(t.ticks().recv_timeout(Duration::from_millis(400)).is_err());
    }
}
