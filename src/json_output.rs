use crate::types::View;
use crossbeam_channel::Receiver;
use log::{error, info};
use std::io::{self, Write};

/// Headless view sink: writes each view as one JSON object per line.
pub struct JsonOutput<W: Write> {
    rx: Receiver<View>,
    out: W,
}

impl JsonOutput<io::Stdout> {
    pub fn stdout(rx: Receiver<View>) -> Self {
        Self::new(rx, io::stdout())
    }
}

impl<W: Write> JsonOutput<W> {
    pub fn new(rx: Receiver<View>, out: W) -> Self {
        Self { rx, out }
    }

    /// Runs until the controller drops its sender. Returns the writer.
    pub fn run(mut self) -> W {
        let mut count: u64 = 0;
        for view in self.rx.iter() {
            let written = serde_json::to_writer(&mut self.out, &view)
                .map_err(io::Error::from)
                .and_then(|_| writeln!(self.out))
                .and_then(|_| self.out.flush());
            if let Err(e) = written {
                error!("JSON output failed: {}", e);
                break;
            }
            count += 1;
        }
        info!("JSON output closed after {} views", count);
        self.out
    }
}
