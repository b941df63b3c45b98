//! Line-oriented terminal output.

use std::io::{self, Write};
use std::sync::Mutex;

use duelview_domain::DuelViewModel;

use super::board::BoardFrame;
use super::card_art::CardArt;
use crate::ports::outbound::{PollStatus, ViewSinkPort};

/// Writes board frames, status lines and chat lines to one writer.
pub struct TerminalSink<W: Write + Send = io::Stdout> {
    art: CardArt,
    out: Mutex<W>,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout(art: CardArt) -> Self {
        Self::new(art, io::stdout())
    }
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(art: CardArt, out: W) -> Self {
        Self {
            art,
            out: Mutex::new(out),
        }
    }

    /// Write a block of text followed by a newline.
    pub fn line(&self, text: &str) {
        let Ok(mut out) = self.out.lock() else {
            tracing::error!("Terminal writer lock poisoned");
            return;
        };
        if let Err(e) = writeln!(out, "{text}").and_then(|_| out.flush()) {
            tracing::warn!(error = %e, "Failed to write to terminal");
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> ViewSinkPort for TerminalSink<W> {
    fn render(&self, view: &DuelViewModel) {
        let frame = BoardFrame::from_view(view, &self.art);
        self.line(&format!("\n{frame}"));
    }

    fn status(&self, status: &PollStatus) {
        self.line(&format!("-- {status}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn writes_frames_and_status_lines() {
        let sink = TerminalSink::new(CardArt::new("img"), Vec::new());
        sink.render(&DuelViewModel::default());
        sink.status(&PollStatus::RateLimited {
            retry_in: Duration::from_millis(4_200),
        });
        sink.line("[12:00] Vex: gl hf");

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.contains("Current Turn: player1"));
        assert!(text.contains("-- Rate limited, retrying in 4s\n"));
        assert!(text.ends_with("[12:00] Vex: gl hf\n"));
    }
}
