//! Users Repository

use async_trait::async_trait;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use mockall::automock;
use sqlx::{FromRow, PgPool, Postgres, Row, postgres::PgRow, query_as};

use crate::users::{NewUser, PasswordHash, User, UsersError};

const INSERT_USER_SQL: &str = include_str!("sql/insert_user.sql");
const GET_USER_BY_EMAIL_SQL: &str = include_str!("sql/get_user_by_email.sql");
const UPDATE_USER_SQL: &str = include_str!("sql/update_user.sql");

#[automock]
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Store a new user. Emails are unique, compared case-insensitively.
    async fn insert_user(&self, user: NewUser) -> Result<User, UsersError>;

    async fn get_user_by_email(&self, email: &str) -> Result<User, UsersError>;

    /// Write `user` back if nobody else updated it since it was read.
    async fn update_user(&self, user: &User) -> Result<User, UsersError>;
}

#[derive(Debug, Clone)]
pub struct PgUsersRepository {
    pool: PgPool,
}

impl PgUsersRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsersRepository for PgUsersRepository {
    async fn insert_user(&self, user: NewUser) -> Result<User, UsersError> {
        query_as::<Postgres, User>(INSERT_USER_SQL)
            .bind(user.name)
            .bind(user.email)
            .bind(user.password.as_str())
            .bind(user.activated)
            .fetch_one(&self.pool)
            .await
            .map_err(UsersError::from)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, UsersError> {
        query_as::<Postgres, User>(GET_USER_BY_EMAIL_SQL)
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(UsersError::from)
    }

    async fn update_user(&self, user: &User) -> Result<User, UsersError> {
        query_as::<Postgres, User>(UPDATE_USER_SQL)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.password.as_str())
            .bind(user.activated)
            .bind(user.id.into_inner())
            .bind(user.version)
            .fetch_optional(&self.pool)
            .await
            .map_err(UsersError::from)?
            .ok_or(UsersError::EditConflict)
    }
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get::<i64, _>("id")?.into(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password: PasswordHash::from_phc(row.try_get("password_hash")?),
            activated: row.try_get("activated")?,
            version: row.try_get("version")?,
        })
    }
}
