//! User CRUD service.
//!
//! # Responsibility
//! - Validate users and emails before any datastore round trip.
//! - Store users as `User` entities keyed by email.
//! - Report lookup misses as `NotFound`; pass storage failures through.
//!
//! # Invariants
//! - The service holds no state; everything flows through `RequestContext`.
//! - Create and update are both upserts and share one write path.
//! - Delete of a missing user succeeds.
//! - Emails and names are never logged above debug level.

use crate::context::RequestContext;
use crate::datastore::{DatastoreError, Entity, Key};
use crate::model::user::{User, USER_KIND};
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type UserServiceResult<T> = Result<T, UserServiceError>;

/// Domain error returned by user operations.
#[derive(Debug)]
pub enum UserServiceError {
    /// Missing user or empty email.
    InvalidInput,
    /// No user stored under the given email.
    NotFound(String),
    /// Datastore failure, unchanged.
    Storage(DatastoreError),
}

impl Display for UserServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput => write!(f, "error: invalid User data"),
            Self::NotFound(email) => write!(f, "user '{email}' not found"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UserServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => err.source(),
            _ => None,
        }
    }
}

impl From<DatastoreError> for UserServiceError {
    fn from(value: DatastoreError) -> Self {
        Self::Storage(value)
    }
}

impl From<serde_json::Error> for UserServiceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Storage(DatastoreError::Codec(value))
    }
}

/// Stateless user service. Every call takes the request context explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserService;

impl UserService {
    pub fn new() -> Self {
        Self
    }

    /// Stores a new user keyed by email, overwriting any existing record.
    ///
    /// # Errors
    /// - `InvalidInput` when `user` is `None` or its email is empty.
    /// - `Storage` when the write fails.
    pub fn create(
        &self,
        ctx: &RequestContext<'_>,
        user: Option<&User>,
    ) -> UserServiceResult<User> {
        self.put_user(ctx, user, "user_create")
    }

    /// Loads one user by email.
    ///
    /// # Errors
    /// - `InvalidInput` when `email` is empty.
    /// - `NotFound` when no record exists under `email`.
    pub fn get_by_email(&self, ctx: &RequestContext<'_>, email: &str) -> UserServiceResult<User> {
        if email.is_empty() {
            return Err(UserServiceError::InvalidInput);
        }

        let entity = ctx
            .datastore()
            .get(ctx.scope(), &user_key(email))
            .inspect_err(|err| log_storage_error("user_get", err))?
            .ok_or_else(|| UserServiceError::NotFound(email.to_string()))?;

        debug!("event=user_get module=service status=ok email={email}");
        Ok(User::from_properties(entity.properties)?)
    }

    /// Lists every stored user. An empty store yields an empty vec.
    pub fn get_users(&self, ctx: &RequestContext<'_>) -> UserServiceResult<Vec<User>> {
        let entities = ctx
            .datastore()
            .query_all(ctx.scope(), USER_KIND)
            .inspect_err(|err| log_storage_error("user_list", err))?;

        let users = entities
            .into_iter()
            .map(|entity| User::from_properties(entity.properties))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "event=user_list module=service status=ok count={}",
            users.len()
        );
        Ok(users)
    }

    /// Overwrites the user stored under `user.email`. Does not require the
    /// record to exist.
    pub fn update(
        &self,
        ctx: &RequestContext<'_>,
        user: Option<&User>,
    ) -> UserServiceResult<User> {
        self.put_user(ctx, user, "user_update")
    }

    /// Removes the user stored under `email`. Succeeds when nothing is stored.
    ///
    /// # Errors
    /// - `InvalidInput` when `email` is empty.
    pub fn delete(&self, ctx: &RequestContext<'_>, email: &str) -> UserServiceResult<()> {
        if email.is_empty() {
            return Err(UserServiceError::InvalidInput);
        }

        ctx.datastore()
            .delete(ctx.scope(), &user_key(email))
            .inspect_err(|err| log_storage_error("user_delete", err))?;

        info!("event=user_delete module=service status=ok");
        Ok(())
    }

    fn put_user(
        &self,
        ctx: &RequestContext<'_>,
        user: Option<&User>,
        event: &'static str,
    ) -> UserServiceResult<User> {
        let user = user.ok_or(UserServiceError::InvalidInput)?;
        user.validate().map_err(|_| UserServiceError::InvalidInput)?;

        let entity = Entity {
            key: user_key(&user.email),
            properties: user.to_properties()?,
        };
        ctx.datastore()
            .put(ctx.scope(), &entity)
            .inspect_err(|err| log_storage_error(event, err))?;

        info!("event={event} module=service status=ok");
        Ok(user.clone())
    }
}

fn user_key(email: &str) -> Key {
    Key::new(USER_KIND, email)
}

fn log_storage_error(event: &str, err: &DatastoreError) {
    error!("event={event} module=service status=error error={err}");
}
