//! Reminder polling.
//!
//! Once per [POLL_INTERVAL] the poller scans the cached tasks and rings the alert sink for
//! every task whose reminder elapsed less than [DUE_WINDOW] ago. Nothing remembers that a
//! task already rang, so a task keeps ringing on every tick until it leaves the window.
//! Reminders more than [DUE_WINDOW] in the past are never rung.

use crate::domain::alert::AlertSink;
use crate::domain::alert::driven_ports::{AckPrompt, AlarmPlayer};
use crate::domain::session::SessionHolder;
use crate::domain::session::driven_ports::TokenStore;
use crate::domain::task::{Task, TaskCache};
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How long after its reminder instant a task still counts as due
pub const DUE_WINDOW: TimeDelta = TimeDelta::milliseconds(5000);

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Why [ReminderPoller::run] stopped
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PollerExit {
    Cancelled,
    SessionEnded,
    NoTasks,
}

/// True when the task's reminder fell within the trailing [DUE_WINDOW] as of `now`
pub fn is_due(task: &Task, now: DateTime<Utc>) -> bool {
    if !task.is_alert_eligible() {
        return false;
    }

    match task.reminder_time {
        Some(reminder_time) => {
            let elapsed = now - reminder_time;
            elapsed >= TimeDelta::zero() && elapsed < DUE_WINDOW
        }
        None => false,
    }
}

pub fn due_tasks(tasks: &[Task], now: DateTime<Utc>) -> impl Iterator<Item = &Task> {
    tasks.iter().filter(move |task| is_due(task, now))
}

pub struct ReminderPoller<C> {
    clock: C,
    cancel: CancellationToken,
    poll_interval: Duration,
}

impl<C: Clock> ReminderPoller<C> {
    pub fn new(clock: C, cancel: CancellationToken) -> Self {
        ReminderPoller {
            clock,
            cancel,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Scans the cache once, ringing for every due task. Returns how many alerts were rung.
    pub async fn tick(
        &self,
        cache: &TaskCache,
        alerts: &AlertSink<impl AlarmPlayer, impl AckPrompt>,
    ) -> usize {
        let now = self.clock.now();
        let tasks = cache.snapshot();

        let mut rung = 0;
        for task in due_tasks(&tasks, now) {
            info!(task_id = task.id, "Reminder due for \"{}\"", task.title);
            alerts.ring(task).await;
            rung += 1;
        }

        rung
    }

    /// Polls until cancelled, until the session ends, or until there is nothing left to
    /// watch. The first scan happens one interval after starting.
    pub async fn run(
        &self,
        session: &SessionHolder<impl TokenStore>,
        cache: &TaskCache,
        alerts: &AlertSink<impl AlarmPlayer, impl AckPrompt>,
    ) -> PollerExit {
        let mut ticker =
            tokio::time::interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Reminder poller started");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Reminder poller cancelled");
                    return PollerExit::Cancelled;
                }
                _ = ticker.tick() => {
                    if !session.is_active() {
                        info!("Session ended, stopping reminder poller");
                        return PollerExit::SessionEnded;
                    }
                    if cache.is_empty() {
                        info!("No tasks left, stopping reminder poller");
                        return PollerExit::NoTasks;
                    }

                    let rung = self.tick(cache, alerts).await;
                    debug!("Poll tick rang {rung} alerts");
                }
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_util::PausedClock;
    use super::*;
    use crate::domain::alert::test_util::{CountingPlayer, FakePrompt};
    use crate::domain::session::test_util::InMemoryTokenStore;
    use crate::domain::task::TaskStatus;
    use crate::domain::task::test_util::{fixed_instant, task_with_id};
    use std::sync::atomic::Ordering;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn reminding_at(id: i64, reminder_time: DateTime<Utc>) -> Task {
        let mut task = task_with_id(id);
        task.reminder_time = Some(reminder_time);
        task
    }

    mod is_due {
        use super::*;

        #[test]
        fn due_two_seconds_after_reminder() {
            let now = fixed_instant();
            let task = reminding_at(1, now - TimeDelta::seconds(2));

            assert!(is_due(&task, now));
        }

        #[test]
        fn done_tasks_never_ring() {
            let now = fixed_instant();
            let mut task = reminding_at(1, now - TimeDelta::seconds(2));
            task.status = TaskStatus::Done;

            assert!(!is_due(&task, now));
        }

        #[test]
        fn missed_reminders_never_ring() {
            let now = fixed_instant();
            let task = reminding_at(1, now - TimeDelta::seconds(10));

            assert!(!is_due(&task, now));
        }

        #[test]
        fn window_is_half_open() {
            let reminder = fixed_instant();
            let task = reminding_at(1, reminder);

            assert!(!is_due(&task, reminder - TimeDelta::milliseconds(1)));
            assert!(is_due(&task, reminder));
            assert!(is_due(&task, reminder + TimeDelta::milliseconds(4999)));
            assert!(!is_due(&task, reminder + TimeDelta::milliseconds(5000)));
        }

        #[test]
        fn tasks_without_reminder_never_ring() {
            assert!(!is_due(&task_with_id(1), fixed_instant()));
        }

        #[test]
        fn due_tasks_keeps_cache_order() {
            let now = fixed_instant();
            let tasks = vec![
                reminding_at(1, now - TimeDelta::seconds(1)),
                reminding_at(2, now + TimeDelta::seconds(30)),
                reminding_at(3, now - TimeDelta::seconds(4)),
            ];

            let due: Vec<i64> = due_tasks(&tasks, now).map(|task| task.id).collect();
            assert_eq!(vec![1, 3], due);
        }
    }

    mod tick {
        use super::*;

        #[tokio::test]
        async fn rings_every_due_task() {
            let now = fixed_instant();
            let cache = TaskCache::new();
            cache.replace(vec![
                reminding_at(1, now - TimeDelta::seconds(2)),
                reminding_at(2, now - TimeDelta::seconds(10)),
                reminding_at(3, now),
            ]);
            let alerts = AlertSink::new(CountingPlayer::default(), FakePrompt::answering(true));
            let poller = ReminderPoller::new(FixedClock(now), CancellationToken::new());

            let rung = poller.tick(&cache, &alerts).await;
            assert_eq!(2, rung);
        }

        #[tokio::test]
        async fn rings_again_on_every_tick_inside_window() {
            let now = fixed_instant();
            let cache = TaskCache::new();
            cache.replace(vec![reminding_at(1, now - TimeDelta::seconds(1))]);
            let alerts = AlertSink::new(CountingPlayer::default(), FakePrompt::answering(false));
            let poller = ReminderPoller::new(FixedClock(now), CancellationToken::new());

            poller.tick(&cache, &alerts).await;
            poller.tick(&cache, &alerts).await;

            assert_eq!(2, alerts.player.plays.load(Ordering::SeqCst));
        }
    }

    mod run {
        use super::*;

        fn logged_in() -> SessionHolder<InMemoryTokenStore> {
            SessionHolder::new(InMemoryTokenStore::with_token("abc"))
                .expect("in-memory token store can't fail")
        }

        #[tokio::test(start_paused = true)]
        async fn stops_when_cache_is_empty() {
            let session = logged_in();
            let cache = TaskCache::new();
            let alerts = AlertSink::new(CountingPlayer::default(), FakePrompt::answering(true));
            let poller = ReminderPoller::new(SystemClock, CancellationToken::new());

            let exit = poller.run(&session, &cache, &alerts).await;
            assert_eq!(PollerExit::NoTasks, exit);
        }

        #[tokio::test(start_paused = true)]
        async fn stops_when_session_ends() {
            let session = SessionHolder::new(InMemoryTokenStore::new())
                .expect("in-memory token store can't fail");
            let cache = TaskCache::new();
            cache.replace(vec![task_with_id(1)]);
            let alerts = AlertSink::new(CountingPlayer::default(), FakePrompt::answering(true));
            let poller = ReminderPoller::new(SystemClock, CancellationToken::new());

            let exit = poller.run(&session, &cache, &alerts).await;
            assert_eq!(PollerExit::SessionEnded, exit);
        }

        #[tokio::test(start_paused = true)]
        async fn stops_when_cancelled() {
            let session = logged_in();
            let cache = TaskCache::new();
            cache.replace(vec![task_with_id(1)]);
            let alerts = AlertSink::new(CountingPlayer::default(), FakePrompt::answering(true));
            let cancel = CancellationToken::new();
            let poller = ReminderPoller::new(SystemClock, cancel.clone());

            let canceller = async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                cancel.cancel();
            };
            let (exit, _) = tokio::join!(poller.run(&session, &cache, &alerts), canceller);
            assert_eq!(PollerExit::Cancelled, exit);
        }

        #[tokio::test(start_paused = true)]
        async fn rings_on_each_tick_while_in_window() {
            let start = fixed_instant();
            let session = logged_in();
            let cache = TaskCache::new();
            // Due 2.5s after starting, so ticks at 3s, 4s, 5s, 6s and 7s fall inside the window
            cache.replace(vec![reminding_at(
                1,
                start + TimeDelta::milliseconds(2500),
            )]);
            let alerts = AlertSink::new(CountingPlayer::default(), FakePrompt::answering(false));
            let cancel = CancellationToken::new();
            let poller = ReminderPoller::new(PausedClock::starting_at(start), cancel.clone());

            let canceller = async {
                tokio::time::sleep(Duration::from_millis(10_500)).await;
                cancel.cancel();
            };
            let (exit, _) = tokio::join!(poller.run(&session, &cache, &alerts), canceller);

            assert_eq!(PollerExit::Cancelled, exit);
            assert_eq!(5, alerts.player.plays.load(Ordering::SeqCst));
        }

        #[tokio::test(start_paused = true)]
        async fn notices_logout_between_ticks() {
            let session = logged_in();
            let cache = TaskCache::new();
            cache.replace(vec![task_with_id(1)]);
            let alerts = AlertSink::new(CountingPlayer::default(), FakePrompt::answering(true));
            let poller = ReminderPoller::new(SystemClock, CancellationToken::new());

            let logout = async {
                tokio::time::sleep(Duration::from_millis(2500)).await;
                session.clear(&cache).expect("in-memory token store can't fail");
            };
            let (exit, _) = tokio::join!(poller.run(&session, &cache, &alerts), logout);
            assert_eq!(PollerExit::SessionEnded, exit);
        }
    }
}
