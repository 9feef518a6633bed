use crate::domain::DrivenPortError;
use crate::domain::session::SessionHolder;
use crate::domain::session::driven_ports::TokenStore;
use crate::domain::task::TaskCache;
use crate::domain::user::driving_ports::AuthError;
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use derive_more::Display;
use tracing::info;
use validator::Validate;

#[derive(Clone, PartialEq, Eq, Debug, Display)]
#[display("{name} <{email}>")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Validate)]
pub struct Registration {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Clone, Debug, Validate)]
pub struct Credentials {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// What the API hands back for a successful login
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LoginGrant {
    pub access_token: String,
    pub user: User,
}

pub mod driven_ports {
    use super::*;

    pub trait Authenticator {
        async fn register(
            &self,
            registration: &Registration,
            ext_cxn: &impl ExternalConnectivity,
        ) -> Result<(), DrivenPortError>;
        async fn login(
            &self,
            credentials: &Credentials,
            ext_cxn: &impl ExternalConnectivity,
        ) -> Result<LoginGrant, DrivenPortError>;
    }
}

pub mod driving_ports {
    use super::*;
    use thiserror::Error;
    use validator::ValidationErrors;

    #[derive(Debug, Error)]
    pub enum AuthError {
        #[error("input was invalid: {0}")]
        Invalid(#[from] ValidationErrors),
        #[error("The email or password was not accepted.")]
        InvalidCredentials,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    pub trait AuthPort {
        async fn register(
            &self,
            registration: &Registration,
            session: &SessionHolder<impl TokenStore>,
            cache: &TaskCache,
            ext_cxn: &impl ExternalConnectivity,
            authenticator: &impl driven_ports::Authenticator,
        ) -> Result<(), AuthError>;
        async fn login(
            &self,
            credentials: &Credentials,
            session: &SessionHolder<impl TokenStore>,
            cache: &TaskCache,
            ext_cxn: &impl ExternalConnectivity,
            authenticator: &impl driven_ports::Authenticator,
        ) -> Result<User, AuthError>;
        fn logout(
            &self,
            session: &SessionHolder<impl TokenStore>,
            cache: &TaskCache,
        ) -> Result<(), anyhow::Error>;
    }
}

pub struct AuthService {}

impl driving_ports::AuthPort for AuthService {
    async fn register(
        &self,
        registration: &Registration,
        session: &SessionHolder<impl TokenStore>,
        cache: &TaskCache,
        ext_cxn: &impl ExternalConnectivity,
        authenticator: &impl driven_ports::Authenticator,
    ) -> Result<(), AuthError> {
        registration.validate()?;

        info!("Registering account for {}", registration.email);
        if let Err(port_err) = authenticator.register(registration, ext_cxn).await {
            let register_err = session.settle_port_error(port_err, "register an account", cache);
            return Err(anyhow::Error::from(register_err).into());
        }

        Ok(())
    }

    async fn login(
        &self,
        credentials: &Credentials,
        session: &SessionHolder<impl TokenStore>,
        cache: &TaskCache,
        ext_cxn: &impl ExternalConnectivity,
        authenticator: &impl driven_ports::Authenticator,
    ) -> Result<User, AuthError> {
        credentials.validate()?;

        let grant = match authenticator.login(credentials, ext_cxn).await {
            Ok(grant) => grant,
            Err(DrivenPortError::Unauthorized) => {
                session.clear(cache)?;
                return Err(AuthError::InvalidCredentials);
            }
            Err(port_err) => {
                return Err(anyhow::Error::from(port_err)
                    .context("logging in")
                    .into());
            }
        };

        session
            .set_token(grant.access_token)
            .context("starting a session after login")?;

        info!("Logged in as user {}", grant.user.id);
        Ok(grant.user)
    }

    fn logout(
        &self,
        session: &SessionHolder<impl TokenStore>,
        cache: &TaskCache,
    ) -> Result<(), anyhow::Error> {
        session.clear(cache)
    }
}
