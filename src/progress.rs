//! Import progress bar and a log writer that keeps it pinned below the logs

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

const IMPORT_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}";

static MULTI_PROGRESS: OnceLock<MultiProgress> = OnceLock::new();

fn multi_progress() -> &'static MultiProgress {
    MULTI_PROGRESS.get_or_init(|| {
        let mp = MultiProgress::new();
        mp.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        mp
    })
}

pub fn add_progress_bar(len: u64) -> ProgressBar {
    multi_progress().add(ProgressBar::new(len))
}

/// Progress bar for importing `len` records; hidden when there is nothing to send
pub fn import_progress_bar(len: usize, collection: &str) -> ProgressBar {
    if len == 0 {
        return ProgressBar::hidden();
    }

    let pb = add_progress_bar(len as u64);
    if let Ok(style) = ProgressStyle::with_template(IMPORT_TEMPLATE) {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.set_message(format!("importing into {}", collection));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Emit one finished log line
///
/// A hidden `MultiProgress` (stderr is not a terminal) discards `println`,
/// so lines go straight to stderr in that case.
fn emit_line(line: &[u8]) {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches('\r');

    let mp = multi_progress();
    if mp.is_hidden() {
        let _ = writeln!(io::stderr().lock(), "{}", line);
    } else {
        let _ = mp.println(line);
    }
}

/// `MakeWriter` for the fmt layer; log lines print above the import bar
#[derive(Default, Clone)]
pub struct LogWriterFactory;

/// Line-buffered writer handed out per log event
#[derive(Default)]
pub struct LogWriter {
    pending: Vec<u8>,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);

        let Some(last_newline) = self.pending.iter().rposition(|b| *b == b'\n') else {
            return Ok(buf.len());
        };
        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);
        for line in complete[..last_newline].split(|b| *b == b'\n') {
            emit_line(line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            emit_line(&std::mem::take(&mut self.pending));
        }
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for LogWriterFactory {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter::default()
    }
}
