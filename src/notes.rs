use crate::types::{Note, Scale};
use rand::Rng;

pub const MAJOR_NOTES: [Note; 7] = [
    Note { name: "C", color: "#845EC2" },
    Note { name: "D", color: "#2C73D2" },
    Note { name: "E", color: "#0081CF" },
    Note { name: "F", color: "#0089BA" },
    Note { name: "G", color: "#008E9B" },
    Note { name: "A", color: "#008F7A" },
    Note { name: "B", color: "#00C9A7" },
];

pub const MINOR_NOTES: [Note; 5] = [
    Note { name: "C#", color: "#845EC2" },
    Note { name: "D#", color: "#4B4453" },
    Note { name: "F#", color: "#C34A36" },
    Note { name: "G#", color: "#FF8066" },
    Note { name: "A#", color: "#B0A8B9" },
];

pub fn notes_for(scale: Scale) -> &'static [Note] {
    match scale {
        Scale::Major => &MAJOR_NOTES,
        Scale::Minor => &MINOR_NOTES,
    }
}

/// Pick a note for `beat`.
///
/// The random index is drawn from `[0, len + beat)` and then reduced modulo
/// `len`, so the draw range widens as the session goes on while the result
/// always stays inside the scale.
pub fn select_note<R: Rng>(scale: Scale, beat: i64, rng: &mut R) -> Note {
    let notes = notes_for(scale);
    let len = notes.len() as i64;
    let span = (len + beat).max(1);
    let index = rng.gen_range(0..span) % len;
    notes[index as usize]
}

/// Memoizes [`select_note`] on `(scale, beat)`: a new note is drawn only when
/// one of the two inputs changes.
#[derive(Debug, Default)]
pub struct NoteSelector {
    key: Option<(Scale, i64)>,
    current: Option<Note>,
    draws: u64,
}

impl NoteSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update<R: Rng>(&mut self, scale: Scale, beat: i64, rng: &mut R) -> Note {
        match (self.key, self.current) {
            (Some(key), Some(note)) if key == (scale, beat) => note,
            _ => {
                let note = select_note(scale, beat, rng);
                self.key = Some((scale, beat));
                self.current = Some(note);
                self.draws += 1;
                note
            }
        }
    }

    pub fn current(&self) -> Option<Note> {
        self.current
    }

    /// Number of random draws made so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }
}
