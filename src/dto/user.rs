use crate::domain;
use serde::{Deserialize, Serialize};

/// Body for `POST /register`
#[derive(Serialize)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct RegisterBody {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl From<&domain::user::Registration> for RegisterBody {
    fn from(value: &domain::user::Registration) -> Self {
        RegisterBody {
            name: value.name.clone(),
            email: value.email.clone(),
            password: value.password.clone(),
        }
    }
}

/// Body for `POST /login`
#[derive(Serialize)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

impl From<&domain::user::Credentials> for LoginBody {
    fn from(value: &domain::user::Credentials) -> Self {
        LoginBody {
            email: value.email.clone(),
            password: value.password.clone(),
        }
    }
}

#[derive(Deserialize, Debug)]
#[cfg_attr(test, derive(Serialize))]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<UserRecord> for domain::user::User {
    fn from(value: UserRecord) -> Self {
        domain::user::User {
            id: value.id,
            name: value.name,
            email: value.email,
        }
    }
}

/// Response of a successful `POST /login`
#[derive(Deserialize, Debug)]
#[cfg_attr(test, derive(Serialize))]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserRecord,
}

impl From<LoginResponse> for domain::user::LoginGrant {
    fn from(value: LoginResponse) -> Self {
        domain::user::LoginGrant {
            access_token: value.access_token,
            user: value.user.into(),
        }
    }
}
