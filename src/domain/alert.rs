use crate::domain::alert::driven_ports::{AckPrompt, AlarmPlayer};
use crate::domain::task::Task;
use tracing::debug;

pub mod driven_ports {
    /// A single playable alarm sound
    #[cfg_attr(test, mockall::automock)]
    pub trait AlarmPlayer {
        /// Start playing. Playing while already playing keeps the current playback going.
        fn play(&self) -> Result<(), anyhow::Error>;
        fn pause(&self);
        /// Move the playback position back to the start of the sound
        fn rewind(&self);
    }

    /// Blocking yes/no question put to the user
    pub trait AckPrompt {
        async fn confirm(&self, message: &str) -> bool;
    }
}

/// Owns the one alarm sound and the prompt used to acknowledge it. Triggers aren't queued:
/// they all share the same player, so the last acknowledgement wins.
pub struct AlertSink<P, Q> {
    pub(crate) player: P,
    pub(crate) prompt: Q,
}

impl<P: AlarmPlayer, Q: AckPrompt> AlertSink<P, Q> {
    pub fn new(player: P, prompt: Q) -> Self {
        AlertSink { player, prompt }
    }

    /// Starts the alarm. Playback is best-effort and failures are only logged.
    pub fn trigger(&self) {
        if let Err(play_err) = self.player.play() {
            debug!("Alarm playback failed: {play_err:#}");
        }
    }

    /// Stops the alarm and rewinds it
    pub fn acknowledge(&self) {
        self.player.pause();
        self.player.rewind();
    }

    /// Sounds the alarm for a task and asks the user to acknowledge it
    pub async fn ring(&self, task: &Task) {
        self.trigger();

        let message = format!("⏰ ALARM: \"{}\"!", task.title);
        if self.prompt.confirm(&message).await {
            self.acknowledge();
        }
    }
}
