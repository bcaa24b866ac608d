//! User storage.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use quillpost_core::{Email, Gender, UserId, UserType};

use super::{Page, RepositoryError, like_pattern, sql_offset};
use crate::models::{NewUser, User, UserChanges, UserFilter};

/// Durable user storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a confirmed account.
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError>;

    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    async fn list(&self, filter: &UserFilter) -> Result<Page<User>, RepositoryError>;

    /// Replace the profile fields. `RepositoryError::NotFound` when no row matched.
    async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, RepositoryError>;

    async fn delete(&self, id: UserId) -> Result<(), RepositoryError>;

    async fn update_password(&self, id: UserId, password_hash: &str)
    -> Result<(), RepositoryError>;
}

const USER_COLUMNS: &str = "id, first_name, last_name, dob, email, phone_number, gender, \
     password_hash, profile_image_url, address, user_type, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    first_name: String,
    last_name: String,
    dob: NaiveDate,
    email: String,
    phone_number: Option<String>,
    gender: Option<String>,
    password_hash: String,
    profile_image_url: Option<String>,
    address: Option<String>,
    user_type: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let gender = row
            .gender
            .as_deref()
            .map(str::parse::<Gender>)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
        let user_type = row
            .user_type
            .parse::<UserType>()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        Ok(Self {
            id: UserId::new(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            dob: row.dob,
            email,
            phone_number: row.phone_number,
            gender,
            password_hash: row.password_hash,
            profile_image_url: row.profile_image_url,
            address: row.address,
            user_type,
            created_at: row.created_at,
        })
    }
}

/// `PostgreSQL` user storage.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_search(builder: &mut QueryBuilder<'_, Postgres>, search: Option<&str>) {
    let Some(search) = search else {
        return;
    };
    let pattern = like_pattern(search);
    builder.push(" WHERE (");
    let mut columns = builder.separated(" OR ");
    for column in ["first_name", "last_name", "phone_number", "email"] {
        columns
            .push(format!("{column} ILIKE "))
            .push_bind_unseparated(pattern.clone());
    }
    builder.push(")");
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO users (first_name, last_name, dob, email, phone_number, gender, \
             password_hash, profile_image_url, address, user_type) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.dob)
            .bind(&user.email)
            .bind(&user.phone_number)
            .bind(user.gender.map(Gender::as_str))
            .bind(&user.password_hash)
            .bind(&user.profile_image_url)
            .bind(&user.address)
            .bind(user.user_type.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "email already exists"))?;

        User::try_from(row)
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn list(&self, filter: &UserFilter) -> Result<Page<User>, RepositoryError> {
        let search = filter.search.as_deref();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_search(&mut count, search);
        let count: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users"));
        push_search(&mut query, search);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(filter.page.limit()))
            .push(" OFFSET ")
            .push_bind(sql_offset(filter.page.offset()));

        let items = query
            .build_query_as::<UserRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page { items, count })
    }

    async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE users SET first_name = $1, last_name = $2, dob = $3, email = $4, \
             phone_number = $5, gender = $6, profile_image_url = $7, address = $8, \
             user_type = $9 \
             WHERE id = $10 \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&changes.first_name)
            .bind(&changes.last_name)
            .bind(changes.dob)
            .bind(&changes.email)
            .bind(&changes.phone_number)
            .bind(changes.gender.map(Gender::as_str))
            .bind(&changes.profile_image_url)
            .bind(&changes.address)
            .bind(changes.user_type.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "email already exists"))?
            .ok_or(RepositoryError::NotFound)?;

        User::try_from(row)
    }

    async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
