use super::{AppContext, CommandError, render};
use crate::domain;
use crate::domain::alert::AlertSink;
use crate::domain::alert::driven_ports::{AckPrompt, AlarmPlayer};
use crate::domain::reminder::{Clock, PollerExit, ReminderPoller, SystemClock};
use crate::domain::task::driven_ports::TaskReader;
use crate::domain::task::driving_ports::TaskPort;
use chrono::Local;
use std::future::Future;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Rings for due reminders until the session ends or the user presses Ctrl-C. The task list
/// is re-fetched every configured refresh interval, and polling resumes whenever a refresh
/// brings tasks back after the list ran empty.
pub async fn watch(
    app: &AppContext,
    task_service: &impl TaskPort,
    task_read: &impl TaskReader,
    alerts: &AlertSink<impl AlarmPlayer, impl AckPrompt>,
) -> Result<(), CommandError> {
    watch_with_clock(app, SystemClock, task_service, task_read, alerts).await
}

pub(crate) async fn watch_with_clock(
    app: &AppContext,
    clock: impl Clock,
    task_service: &impl TaskPort,
    task_read: &impl TaskReader,
    alerts: &AlertSink<impl AlarmPlayer, impl AckPrompt>,
) -> Result<(), CommandError> {
    task_service
        .refresh(&app.session, &app.cache, &app.ext_cxn, task_read)
        .await?;
    println!("{}", render::task_list(&app.cache.snapshot(), &Local));
    println!("Watching for reminders. Press Ctrl-C to stop.");

    let cancel = CancellationToken::new();
    let poller = ReminderPoller::new(clock, cancel.clone());
    let mut polling = (!app.cache.is_empty())
        .then(|| Box::pin(poller.run(&app.session, &app.cache, alerts)));
    if polling.is_none() {
        info!("No tasks yet, waiting for the next refresh");
    }

    let refresh_every = app.config.refresh_interval;
    let mut refresh_ticker = tokio::time::interval_at(Instant::now() + refresh_every, refresh_every);
    refresh_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let result = loop {
        tokio::select! {
            exit = next_exit(&mut polling) => match exit {
                PollerExit::NoTasks => {
                    polling = None;
                    info!("Task list is empty, waiting for the next refresh");
                }
                PollerExit::SessionEnded => break Err(CommandError::SessionExpired),
                PollerExit::Cancelled => break Ok(()),
            },
            _ = refresh_ticker.tick() => {
                match task_service
                    .refresh(&app.session, &app.cache, &app.ext_cxn, task_read)
                    .await
                {
                    Ok(()) => {
                        info!("Refreshed {} tasks", app.cache.len());
                        if polling.is_none() && !app.cache.is_empty() {
                            info!("Tasks are back, resuming reminder polling");
                            polling = Some(Box::pin(poller.run(&app.session, &app.cache, alerts)));
                        }
                    }
                    Err(domain::Error::Unauthorized) => break Err(CommandError::SessionExpired),
                    Err(refresh_err) => warn!("Periodic refresh failed: {refresh_err}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
                println!("Stopped watching.");
                break Ok(());
            }
        }
    };
    drop(polling);
    alerts.acknowledge();

    result
}

/// Resolves with the poller's exit, or never when nothing is being polled
async fn next_exit<F>(polling: &mut Option<std::pin::Pin<Box<F>>>) -> PollerExit
where
    F: Future<Output = PollerExit>,
{
    match polling {
        Some(run) => run.await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::task_cmds::tests::logged_in_app;
    use crate::domain::alert::test_util::{CountingPlayer, FakePrompt};
    use crate::domain::reminder::test_util::PausedClock;
    use crate::domain::task::TaskService;
    use crate::domain::task::test_util::{InMemoryTaskApi, fixed_instant, task_with_id};
    use crate::domain::test_util::Connectivity;
    use chrono::TimeDelta;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test(start_paused = true)]
    async fn keeps_ringing_after_a_refresh_outage() {
        let dir = TempDir::new().expect("temp dir");
        let app = logged_in_app(&dir);
        let start = fixed_instant();
        let mut task = task_with_id(1);
        task.reminder_time = Some(start + TimeDelta::milliseconds(62_500));
        let task_api = InMemoryTaskApi::new_with_tasks(vec![task]);
        let alerts = AlertSink::new(CountingPlayer::default(), FakePrompt::answering(true));

        // Refreshes run every 30s: the one at 30s fails and the one at 60s brings the task back
        let outage = async {
            tokio::time::sleep(Duration::from_secs(25)).await;
            task_api.write().expect("lock").connected = Connectivity::Disconnected;
            tokio::time::sleep(Duration::from_secs(10)).await;
            task_api.write().expect("lock").connected = Connectivity::Connected;
            tokio::time::sleep(Duration::from_secs(35)).await;
            task_api.write().expect("lock").connected = Connectivity::Rejected;
        };
        let (watch_result, _) = tokio::join!(
            watch_with_clock(
                &app,
                PausedClock::starting_at(start),
                &TaskService {},
                &task_api,
                &alerts
            ),
            outage
        );

        assert!(matches!(watch_result, Err(CommandError::SessionExpired)));
        assert_eq!(5, alerts.player.plays.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn starts_polling_once_tasks_appear() {
        let dir = TempDir::new().expect("temp dir");
        let app = logged_in_app(&dir);
        let start = fixed_instant();
        let task_api = InMemoryTaskApi::new_locked();
        let alerts = AlertSink::new(CountingPlayer::default(), FakePrompt::answering(true));

        let add_task_later = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            let mut task = task_with_id(1);
            task.reminder_time = Some(start + TimeDelta::milliseconds(32_500));
            task_api.write().expect("lock").tasks.push(task);
            tokio::time::sleep(Duration::from_secs(30)).await;
            task_api.write().expect("lock").connected = Connectivity::Rejected;
        };
        let (watch_result, _) = tokio::join!(
            watch_with_clock(
                &app,
                PausedClock::starting_at(start),
                &TaskService {},
                &task_api,
                &alerts
            ),
            add_task_later
        );

        assert!(matches!(watch_result, Err(CommandError::SessionExpired)));
        assert_eq!(5, alerts.player.plays.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_refresh_ends_with_expired_session() {
        let dir = TempDir::new().expect("temp dir");
        let app = logged_in_app(&dir);
        let task_api = InMemoryTaskApi::new_with_tasks(vec![task_with_id(1)]);
        let alerts = AlertSink::new(CountingPlayer::default(), FakePrompt::answering(true));

        let revoke = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            task_api.write().expect("lock").connected = Connectivity::Rejected;
        };
        let (watch_result, _) =
            tokio::join!(watch(&app, &TaskService {}, &task_api, &alerts), revoke);

        assert!(matches!(watch_result, Err(CommandError::SessionExpired)));
        assert!(!app.session.is_active());
    }

    #[tokio::test]
    async fn not_logged_in_never_polls() {
        let dir = TempDir::new().expect("temp dir");
        let app = logged_in_app(&dir);
        app.session.clear(&app.cache).expect("temp storage is writable");
        let task_api = InMemoryTaskApi::new_locked();
        let alerts = AlertSink::new(CountingPlayer::default(), FakePrompt::answering(true));

        let watch_result = watch(&app, &TaskService {}, &task_api, &alerts).await;

        assert!(matches!(watch_result, Err(CommandError::NotLoggedIn)));
    }
}
