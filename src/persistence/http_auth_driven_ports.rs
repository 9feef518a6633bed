use super::send_checked;
use crate::domain;
use crate::domain::DrivenPortError;
use crate::domain::user::{Credentials, LoginGrant, Registration};
use crate::dto::user::{LoginBody, LoginResponse, RegisterBody};
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;

pub struct HttpAuthenticator {}

impl domain::user::driven_ports::Authenticator for HttpAuthenticator {
    #[tracing::instrument(skip_all)]
    async fn register(
        &self,
        registration: &Registration,
        ext_cxn: &impl ExternalConnectivity,
    ) -> Result<(), DrivenPortError> {
        let request = ext_cxn
            .http_client()
            .post(ext_cxn.api_url("/register"))
            .json(&RegisterBody::from(registration));
        send_checked(request, "register").await?;

        Ok(())
    }

    #[tracing::instrument(skip_all)]
    async fn login(
        &self,
        credentials: &Credentials,
        ext_cxn: &impl ExternalConnectivity,
    ) -> Result<LoginGrant, DrivenPortError> {
        let request = ext_cxn
            .http_client()
            .post(ext_cxn.api_url("/login"))
            .json(&LoginBody::from(credentials));
        let response: LoginResponse = send_checked(request, "log in")
            .await?
            .json()
            .await
            .context("decoding the login response")?;

        Ok(response.into())
    }
}
