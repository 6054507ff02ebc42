use crate::notes::NoteSelector;
use crate::sound::{SoundTrigger, TickSound};
use crate::timer::BeatTimer;
use crate::types::*;
use crossbeam_channel::{select, Receiver, Sender};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Root state machine of the trainer.
///
/// Holds the Idle/Running phase and the user parameters, and owns the three
/// derived components: the beat timer, the memoized note selector and the
/// sound trigger. Every command and every tick is applied serially, then the
/// derived state is refreshed in order (timer → selector → sound).
///
/// The periodic schedule lives inside the [`BeatTimer`]; whenever `bpm` or the
/// phase changes, the old schedule is dropped and (if running) a new one is
/// created, so no tick from a stale schedule can ever be observed.
pub struct Controller {
    phase: Phase,
    params: Params,
    timer: BeatTimer,
    selector: NoteSelector,
    sound: SoundTrigger,
    rng: StdRng,
}

impl Controller {
    pub fn new(params: Params, sound: Box<dyn TickSound>) -> Self {
        Self {
            phase: Phase::Idle,
            params,
            timer: BeatTimer::new(params.bpm),
            selector: NoteSelector::new(),
            sound: SoundTrigger::new(sound),
            rng: StdRng::from_entropy(),
        }
    }

    /// Use a fixed RNG seed for a reproducible note sequence.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn params(&self) -> Params {
        self.params
    }

    pub fn beat(&self) -> i64 {
        self.timer.beat()
    }

    /// Random draws made by the note selector so far.
    pub fn note_draws(&self) -> u64 {
        self.selector.draws()
    }

    pub fn view(&self) -> View {
        let beat = self.timer.beat();
        let note = match self.phase {
            Phase::Running if beat != BEAT_IDLE => self.selector.current(),
            _ => None,
        };
        View {
            phase: self.phase,
            bpm: self.params.bpm,
            scale: self.params.scale,
            beat,
            note,
        }
    }

    /// Apply one user command. Returns `false` once the session should end.
    pub fn handle(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Start => self.set_phase(Phase::Running),
            Command::Stop => self.set_phase(Phase::Idle),
            Command::Toggle => match self.phase {
                Phase::Idle => self.set_phase(Phase::Running),
                Phase::Running => self.set_phase(Phase::Idle),
            },
            Command::SetBpm(bpm) => self.set_bpm(bpm),
            Command::NudgeBpm(delta) => self.set_bpm(self.params.bpm as i64 + delta),
            Command::SetScale(scale) => self.set_scale(scale),
            Command::ToggleScale => self.set_scale(self.params.scale.toggled()),
            Command::Quit => {
                info!("Quit requested");
                return false;
            }
        }
        self.refresh();
        true
    }

    /// Count one tick of the running schedule.
    pub fn on_tick(&mut self) {
        if self.phase != Phase::Running {
            return;
        }
        let beat = self.timer.advance();
        debug!("Beat {}", beat);
        self.refresh();
    }

    /// Serialized event loop: waits on user commands and timer ticks, applies
    /// whichever arrives, and publishes a fresh [`View`] after each one.
    ///
    /// Returns on [`Command::Quit`] or when the command channel disconnects.
    pub fn run(&mut self, commands: Receiver<Command>, views: Vec<Sender<View>>) {
        info!(
            "Controller running ({} bpm, {} scale)",
            self.params.bpm, self.params.scale
        );
        self.publish(&views);

        loop {
            let ticks = self.timer.ticks();
            let keep_going = select! {
                recv(commands) -> msg => match msg {
                    Ok(cmd) => self.handle(cmd),
                    Err(_) => {
                        debug!("Command channel closed");
                        false
                    }
                },
                recv(ticks) -> _ => {
                    self.on_tick();
                    true
                },
            };
            if !keep_going {
                break;
            }
            self.publish(&views);
        }

        self.set_phase(Phase::Idle);
        self.refresh();
        self.publish(&views);
        info!("Controller shutting down");
    }

    fn set_phase(&mut self, phase: Phase) {
        if phase == self.phase {
            return;
        }
        self.phase = phase;
        self.timer.set_running(phase == Phase::Running);
        match phase {
            Phase::Running => info!("Started at {} bpm ({})", self.params.bpm, self.params.scale),
            Phase::Idle => info!("Stopped"),
        }
    }

    fn set_bpm(&mut self, bpm: i64) {
        let bpm = Params::clamp_bpm(bpm);
        if bpm != self.params.bpm {
            debug!("BPM {} → {}", self.params.bpm, bpm);
            self.params.bpm = bpm;
            self.timer.set_bpm(bpm);
        }
    }

    fn set_scale(&mut self, scale: Scale) {
        if scale != self.params.scale {
            debug!("Scale {} → {}", self.params.scale, scale);
            self.params.scale = scale;
        }
    }

    fn refresh(&mut self) {
        let beat = self.timer.beat();
        self.selector.update(self.params.scale, beat, &mut self.rng);
        self.sound.update(self.phase == Phase::Running, beat);
    }

    fn publish(&self, views: &[Sender<View>]) {
        let view = self.view();
        for tx in views {
            let _ = tx.send(view);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::{MAJOR_NOTES, MINOR_NOTES};
    use crate::sound::tests::{Call, RecordingSound};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn controller() -> (Controller, Rc<RefCell<Vec<Call>>>) {
        let rec = RecordingSound::default();
        let log = rec.0.clone();
        let c = Controller::new(Params::default(), Box::new(rec)).with_seed(42);
        (c, log)
    }

    #[test]
    fn test_initial_state_is_idle() {
        let (c, log) = controller();
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.beat(), BEAT_IDLE);
        let v = c.view();
        assert_eq!(v.button_label(), "Start");
        assert!(v.note.is_none());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_start_shows_no_note_until_first_tick() {
        let (mut c, log) = controller();
        assert!(c.handle(Command::Start));
        assert_eq!(c.phase(), Phase::Running);
        assert_eq!(c.beat(), BEAT_IDLE);
        let v = c.view();
        assert_eq!(v.button_label(), "Stop");
        assert!(v.note.is_none());
        assert!(log.borrow().is_empty());

        c.on_tick();
        assert_eq!(c.beat(), 0);
        let note = c.view().note.expect("note after first tick");
        assert!(MAJOR_NOTES.contains(&note));
        assert_eq!(*log.borrow(), [Call::Play]);
    }

    #[test]
    fn test_stop_resets_and_silences() {
        let (mut c, log) = controller();
        c.handle(Command::Start);
        for _ in 0..4 {
            c.on_tick();
        }
        assert_eq!(c.beat(), 3);

        c.handle(Command::Stop);
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.beat(), BEAT_IDLE);
        let v = c.view();
        assert!(v.note.is_none());
        assert_eq!(v.button_label(), "Start");
        assert_eq!(log.borrow().last(), Some(&Call::Stop));

        let plays = log.borrow().iter().filter(|&&k| k == Call::Play).count();
        let stops = log.borrow().iter().filter(|&&k| k == Call::Stop).count();
        assert_eq!(plays, 4);
        assert_eq!(stops, 4);
    }

    #[test]
    fn test_tick_while_idle_is_ignored() {
        let (mut c, log) = controller();
        c.on_tick();
        assert_eq!(c.beat(), BEAT_IDLE);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_toggle_cycles_phases() {
        let (mut c, _) = controller();
        c.handle(Command::Toggle);
        assert_eq!(c.phase(), Phase::Running);
        c.handle(Command::Toggle);
        assert_eq!(c.phase(), Phase::Idle);
        c.handle(Command::Toggle);
        assert_eq!(c.phase(), Phase::Running);
    }

    #[test]
    fn test_scale_change_keeps_beat() {
        let (mut c, log) = controller();
        c.handle(Command::Start);
        c.on_tick();
        c.on_tick();
        let plays_before = log.borrow().len();

        c.handle(Command::SetScale(Scale::Minor));
        assert_eq!(c.beat(), 1);
        let note = c.view().note.unwrap();
        assert!(MINOR_NOTES.contains(&note));
        assert_eq!(log.borrow().len(), plays_before, "scale change is not a beat");

        c.handle(Command::ToggleScale);
        assert_eq!(c.params().scale, Scale::Major);
        assert!(MAJOR_NOTES.contains(&c.view().note.unwrap()));
    }

    #[test]
    fn test_bpm_commands_clamp_and_keep_beat() {
        let (mut c, _) = controller();
        c.handle(Command::SetBpm(500));
        assert_eq!(c.params().bpm, BPM_MAX);
        c.handle(Command::NudgeBpm(-1000));
        assert_eq!(c.params().bpm, BPM_MIN);

        c.handle(Command::Start);
        c.on_tick();
        c.handle(Command::NudgeBpm(10));
        assert_eq!(c.params().bpm, 50);
        assert_eq!(c.beat(), 0);
    }

    #[test]
    fn test_no_extra_draws_between_beats() {
        let (mut c, _) = controller();
        c.handle(Command::Start);
        c.on_tick();
        let draws = c.note_draws();
        let note = c.view().note;
        for _ in 0..20 {
            c.handle(Command::Start);
            c.handle(Command::SetBpm(40));
            assert_eq!(c.view().note, note);
        }
        assert_eq!(c.note_draws(), draws);

        c.on_tick();
        assert_eq!(c.note_draws(), draws + 1);
    }

    #[test]
    fn test_quit_ends_session() {
        let (mut c, _) = controller();
        assert!(!c.handle(Command::Quit));
    }
}
