use super::{AppContext, CommandError};
use crate::domain::session::SessionHolder;
use crate::domain::session::driven_ports::TokenStore;
use crate::domain::task::TaskCache;
use crate::domain::task::driven_ports::TaskReader;
use crate::domain::task::driving_ports::TaskPort;
use crate::domain::user::driven_ports::Authenticator;
use crate::domain::user::driving_ports::AuthPort;
use crate::domain::user::{Credentials, Registration};
use tracing::warn;

pub async fn register(
    registration: &Registration,
    app: &AppContext,
    auth_service: &impl AuthPort,
    authenticator: &impl Authenticator,
) -> Result<(), CommandError> {
    auth_service
        .register(
            registration,
            &app.session,
            &app.cache,
            &app.ext_cxn,
            authenticator,
        )
        .await?;

    println!("Registered {}. You can log in now.", registration.email);
    Ok(())
}

/// Logs in, then fetches the task list so the user sees where they left off
pub async fn login(
    credentials: &Credentials,
    app: &AppContext,
    auth_service: &impl AuthPort,
    authenticator: &impl Authenticator,
    task_service: &impl TaskPort,
    task_read: &impl TaskReader,
) -> Result<(), CommandError> {
    let user = auth_service
        .login(
            credentials,
            &app.session,
            &app.cache,
            &app.ext_cxn,
            authenticator,
        )
        .await?;
    println!("Logged in as {user}.");

    match task_service
        .refresh(&app.session, &app.cache, &app.ext_cxn, task_read)
        .await
    {
        Ok(()) => println!("You have {} tasks.", app.cache.len()),
        Err(refresh_err) => warn!("Could not fetch tasks after login: {refresh_err}"),
    }

    Ok(())
}

pub fn logout(
    session: &SessionHolder<impl TokenStore>,
    cache: &TaskCache,
    auth_service: &impl AuthPort,
) -> Result<(), CommandError> {
    auth_service.logout(session, cache)?;

    println!("Logged out.");
    Ok(())
}
