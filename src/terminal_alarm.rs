//! Alarm playback and acknowledgement on the controlling terminal

use crate::domain::alert::driven_ports::{AckPrompt, AlarmPlayer};
use anyhow::Context;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::task::JoinHandle;
use tracing::debug;

const BELL: &[u8] = b"\x07";
const RING_SPACING: Duration = Duration::from_secs(1);

/// Rings the terminal bell once a second for a fixed number of rings. The number of rings
/// already sounded is the playback position.
pub struct BellPlayer {
    rings: u64,
    position: Arc<AtomicU64>,
    playback: Mutex<Option<JoinHandle<()>>>,
}

impl BellPlayer {
    pub fn new(rings: u64) -> BellPlayer {
        BellPlayer {
            rings,
            position: Arc::new(AtomicU64::new(0)),
            playback: Mutex::new(None),
        }
    }

    pub fn position(&self) -> u64 {
        self.position.load(Ordering::SeqCst)
    }

    pub fn is_playing(&self) -> bool {
        self.playback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl AlarmPlayer for BellPlayer {
    fn play(&self) -> Result<(), anyhow::Error> {
        let mut playback = self.playback.lock().unwrap_or_else(PoisonError::into_inner);
        if playback.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .context("the alarm needs a running tokio runtime")?;
        let rings = self.rings;
        // Playing after the last ring starts over from the top
        if self.position.load(Ordering::SeqCst) >= rings {
            self.position.store(0, Ordering::SeqCst);
        }
        let position = Arc::clone(&self.position);
        *playback = Some(runtime.spawn(async move {
            while position.load(Ordering::SeqCst) < rings {
                let mut stderr = std::io::stderr();
                if let Err(write_err) = stderr.write_all(BELL).and_then(|_| stderr.flush()) {
                    debug!("Could not ring the terminal bell: {write_err}");
                    return;
                }
                position.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(RING_SPACING).await;
            }
        }));

        Ok(())
    }

    fn pause(&self) {
        if let Some(handle) = self
            .playback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }

    fn rewind(&self) {
        self.position.store(0, Ordering::SeqCst);
    }
}

/// Asks yes/no questions on stdout and reads the answer from stdin
pub struct StdinPrompt {
    lines: tokio::sync::Mutex<Lines<BufReader<Stdin>>>,
}

impl StdinPrompt {
    pub fn new() -> StdinPrompt {
        StdinPrompt {
            lines: tokio::sync::Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl Default for StdinPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl AckPrompt for StdinPrompt {
    async fn confirm(&self, message: &str) -> bool {
        println!("{message} [Y/n]");

        let mut lines = self.lines.lock().await;
        match lines.next_line().await {
            Ok(answer) => accepts(answer.as_deref()),
            Err(read_err) => {
                debug!("Could not read an answer from stdin: {read_err}");
                false
            }
        }
    }
}

/// An empty answer or anything starting with `y` confirms. A closed stdin does not.
fn accepts(answer: Option<&str>) -> bool {
    match answer.map(str::trim) {
        Some("") => true,
        Some(answer) => answer.to_ascii_lowercase().starts_with('y'),
        None => false,
    }
}
