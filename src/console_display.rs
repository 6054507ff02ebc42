use crate::types::*;
use crossbeam_channel::Receiver;
use std::io::{self, Write};

const WIDTH: usize = 44;
const GLYPH_ROWS: usize = 5;

/// Draws the trainer panel in the terminal, one redraw per received view.
pub struct ConsoleDisplay {
    rx: Receiver<View>,
}

impl ConsoleDisplay {
    pub fn new(rx: Receiver<View>) -> Self {
        Self { rx }
    }

    pub fn run(&self) {
        let mut stdout = io::stdout();
        let mut last: Option<View> = None;

        for view in self.rx.iter() {
            if last == Some(view) {
                continue;
            }
            last = Some(view);

            // Clear screen and move cursor home
            let _ = write!(stdout, "\x1b[2J\x1b[H{}", render(&view));
            let _ = stdout.flush();
        }
    }
}

/// Render one frame of the panel.
///
/// Idle shows only the Start control. Running shows the current note in
/// large coloured glyphs (blank before the first beat) and the Stop control.
pub fn render(view: &View) -> String {
    let mut out = String::new();
    let rule = "═".repeat(WIDTH);

    out.push_str(&format!("╔{rule}╗\n"));
    push_line(&mut out, "  NOTE TRAINER");
    out.push_str(&format!("╠{rule}╣\n"));
    push_line(
        &mut out,
        &format!("  Tempo: {:>3} bpm     Scale: {}", view.bpm, view.scale),
    );
    push_line(&mut out, "");

    if view.phase == Phase::Running {
        match view.note {
            Some(note) => {
                let (r, g, b) = note.rgb();
                for row in big_text(note.name) {
                    let pad = WIDTH.saturating_sub(row.chars().count());
                    let left = pad / 2;
                    out.push_str(&format!(
                        "║{}\x1b[38;2;{r};{g};{b}m{row}\x1b[0m{}║\n",
                        " ".repeat(left),
                        " ".repeat(pad - left),
                    ));
                }
            }
            None => {
                for _ in 0..GLYPH_ROWS {
                    push_line(&mut out, "");
                }
            }
        }
        push_line(&mut out, "");
    }

    push_centered(&mut out, &format!("[ {} ]", view.button_label()));
    push_line(&mut out, "");
    push_line(&mut out, "  s start/stop  +/- bpm  m scale  q quit");
    out.push_str(&format!("╚{rule}╝\n"));
    out
}

fn push_line(out: &mut String, text: &str) {
    let pad = WIDTH.saturating_sub(text.chars().count());
    out.push_str(&format!("║{text}{}║\n", " ".repeat(pad)));
}

fn push_centered(out: &mut String, text: &str) {
    let pad = WIDTH.saturating_sub(text.chars().count());
    let left = pad / 2;
    push_line(out, &format!("{}{text}", " ".repeat(left)));
}

/// Lay out a note name as rows of block glyphs.
fn big_text(name: &str) -> Vec<String> {
    let mut rows = vec![String::new(); GLYPH_ROWS];
    for (i, ch) in name.chars().enumerate() {
        let glyph = glyph(ch);
        for (row, line) in rows.iter_mut().zip(glyph.iter()) {
            if i > 0 {
                row.push(' ');
            }
            row.push_str(line);
        }
    }
    rows
}

fn glyph(ch: char) -> [&'static str; GLYPH_ROWS] {
    match ch {
        'A' => [" ███ ", "█   █", "█████", "█   █", "█   █"],
        'B' => ["████ ", "█   █", "████ ", "█   █", "████ "],
        'C' => [" ████", "█    ", "█    ", "█    ", " ████"],
        'D' => ["████ ", "█   █", "█   █", "█   █", "████ "],
        'E' => ["█████", "█    ", "████ ", "█    ", "█████"],
        'F' => ["█████", "█    ", "████ ", "█    ", "█    "],
        'G' => [" ████", "█    ", "█  ██", "█   █", " ████"],
        '#' => [" █ █ ", "█████", " █ █ ", "█████", " █ █ "],
        _ => ["     ", "  ?  ", "     ", "     ", "     "],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::{MAJOR_NOTES, MINOR_NOTES};

    fn view(phase: Phase, beat: i64, note: Option<Note>) -> View {
        View {
            phase,
            bpm: 60,
            scale: Scale::Major,
            beat,
            note,
        }
    }

    #[test]
    fn test_idle_shows_start_only() {
        let s = render(&view(Phase::Idle, BEAT_IDLE, None));
        assert!(s.contains("[ Start ]"));
        assert!(!s.contains("[ Stop ]"));
        assert!(!s.contains("\x1b[38;2;"), "no coloured note while idle");
    }

    #[test]
    fn test_running_shows_coloured_note_and_stop() {
        let s = render(&view(Phase::Running, 0, Some(MAJOR_NOTES[0])));
        assert!(s.contains("[ Stop ]"));
        assert!(!s.contains("[ Start ]"));
        // #845EC2
        assert!(s.contains("\x1b[38;2;132;94;194m"));
        assert_eq!(s.matches("\x1b[38;2;").count(), GLYPH_ROWS);
    }

    #[test]
    fn test_running_without_note_leaves_area_blank() {
        let s = render(&view(Phase::Running, BEAT_IDLE, None));
        assert!(s.contains("[ Stop ]"));
        assert!(!s.contains("\x1b[38;2;"));
    }

    #[test]
    fn test_every_note_has_a_glyph() {
        for note in MAJOR_NOTES.iter().chain(MINOR_NOTES.iter()) {
            for row in big_text(note.name) {
                assert!(!row.contains('?'), "missing glyph in {}", note.name);
            }
        }
    }

    #[test]
    fn test_panel_rows_are_aligned() {
        let s = render(&view(Phase::Running, 2, Some(MINOR_NOTES[3])));
        for line in s.lines() {
            let plain = strip_ansi(line);
            assert_eq!(plain.chars().count(), WIDTH + 2, "misaligned: {plain:?}");
        }
    }

    fn strip_ansi(s: &str) -> String {
        let mut out = String::new();
        let mut in_escape = false;
        for c in s.chars() {
            match (in_escape, c) {
                (false, '\x1b') => in_escape = true,
                (true, 'm') => in_escape = false,
                (true, _) => {}
                (false, c) => out.push(c),
            }
        }
        out
    }
}
