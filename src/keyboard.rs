use crate::types::{Command, Scale};
use crossbeam_channel::Sender;
use log::{info, warn};
use std::io::{self, BufRead};

/// Reads one command per line from stdin and forwards it to the controller.
///
/// End of input is treated as a quit request.
pub struct KeyboardInput {
    tx: Sender<Command>,
}

impl KeyboardInput {
    pub fn new(tx: Sender<Command>) -> Self {
        Self { tx }
    }

    /// Blocks the calling thread until stdin closes or the controller exits.
    pub fn run(&self) {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    warn!("stdin read failed: {}", e);
                    break;
                }
            };
            let Some(cmd) = parse_command(&line) else {
                warn!("Unrecognised input {:?} (try: s, +, -, bpm 120, m, q)", line.trim());
                continue;
            };
            if self.tx.send(cmd).is_err() || cmd == Command::Quit {
                return;
            }
        }
        info!("Input closed");
        let _ = self.tx.send(Command::Quit);
    }
}

pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let lower = line.to_ascii_lowercase();
    let cmd = match lower.as_str() {
        "" | "s" | "space" => Command::Toggle,
        "start" => Command::Start,
        "stop" => Command::Stop,
        "+" => Command::NudgeBpm(1),
        "-" => Command::NudgeBpm(-1),
        "++" => Command::NudgeBpm(10),
        "--" => Command::NudgeBpm(-10),
        "m" => Command::ToggleScale,
        "q" | "quit" | "exit" => Command::Quit,
        other => {
            if let Ok(scale) = other.parse::<Scale>() {
                Command::SetScale(scale)
            } else if let Some(n) = other.strip_prefix("bpm") {
                Command::SetBpm(n.trim().parse().ok()?)
            } else {
                Command::SetBpm(other.parse().ok()?)
            }
        }
    };
    Some(cmd)
}
