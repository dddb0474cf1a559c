/// PostgreSQL backend
///
/// [`PgRepository`] turns a [`Filter`] / [`Sort`] / [`PageRequest`] into SQL
/// with `sqlx::QueryBuilder`. Every value is a bind parameter. Column names
/// are `&'static str` from the entity definitions, never request input.
///
/// The typed stores ([`PgUserStore`], [`PgTaskStore`], [`PgAuditStore`])
/// add the entity-specific `INSERT` and `UPDATE` statements, each inside a
/// transaction.
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::models::task::Task;
/// use taskdesk_shared::repository::postgres::PgRepository;
/// use taskdesk_shared::repository::{Filter, PageRequest, Sort};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let tasks = PgRepository::<Task>::new(pool);
/// let page = tasks
///     .get_paging(&Filter::new().ilike("title", "report"), PageRequest::default(), Sort::default())
///     .await?;
/// println!("{} of {} tasks", page.data_paging.len(), page.total_data);
/// # Ok(())
/// # }
/// ```

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::{
    escape_like, AuditStore, Condition, Entity, FieldValue, Filter, HealthCheck, Page,
    PageRequest, RepositoryError, Sort, TaskStore, UserStore,
};
use crate::db::pool::health_check;
use crate::models::audit::{AuditRecord, CreateAudit};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User};

/// Generic read/soft-delete operations for one table
pub struct PgRepository<E> {
    pool: PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for PgRepository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> PgRepository<E> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn select() -> QueryBuilder<'static, Postgres> {
        QueryBuilder::new(format!("SELECT {} FROM {}", E::COLUMNS, E::TABLE))
    }

    /// First live row matching the filter
    pub async fn find_one(&self, filter: &Filter) -> Result<Option<E>, RepositoryError> {
        let mut query = Self::select();
        push_where(&mut query, filter);
        query.push(" LIMIT 1");

        let row = query
            .build_query_as::<E>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Every live row matching the filter, in sort order
    pub async fn queries(&self, filter: &Filter, sort: Sort) -> Result<Vec<E>, RepositoryError> {
        let mut query = Self::select();
        push_where(&mut query, filter);
        push_order(&mut query, sort);

        let rows = query.build_query_as::<E>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Number of live rows matching the filter
    pub async fn count(&self, filter: &Filter) -> Result<i64, RepositoryError> {
        let mut query = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", E::TABLE));
        push_where(&mut query, filter);

        let (count,): (i64,) = query.build_query_as().fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// One page of live rows plus the total count
    pub async fn get_paging(
        &self,
        filter: &Filter,
        page: PageRequest,
        sort: Sort,
    ) -> Result<Page<E>, RepositoryError> {
        let mut query = Self::select();
        push_where(&mut query, filter);
        push_order(&mut query, sort);
        query
            .push(" LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let (rows, total) = tokio::try_join!(
            async {
                query
                    .build_query_as::<E>()
                    .fetch_all(&self.pool)
                    .await
                    .map_err(RepositoryError::from)
            },
            self.count(filter)
        )?;

        debug!(
            table = E::TABLE,
            page = page.page,
            limit = page.limit,
            total,
            "Fetched page"
        );
        Ok(Page::new(rows, total, page))
    }

    /// Sets `deleted = TRUE` on every live row matching the filter
    ///
    /// Returns whether any row was affected.
    pub async fn soft_delete(&self, filter: &Filter) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mut query = QueryBuilder::new(format!(
            "UPDATE {} SET deleted = TRUE, updated_at = NOW()",
            E::TABLE
        ));
        push_where(&mut query, filter);
        let result = query.build().execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Appends `WHERE deleted = FALSE AND ...`
fn push_where(query: &mut QueryBuilder<'static, Postgres>, filter: &Filter) {
    query.push(" WHERE deleted = FALSE");

    for condition in filter.conditions() {
        query.push(" AND ");
        match condition {
            Condition::Eq { column, value } => {
                query.push(*column);
                if matches!(value, FieldValue::Null) {
                    query.push(" IS NULL");
                } else {
                    query.push(" = ");
                    push_value(query, value);
                }
            }
            Condition::ILike { column, needle } => {
                query
                    .push(*column)
                    .push(" ILIKE ")
                    .push_bind(format!("%{}%", escape_like(needle)));
            }
        }
    }
}

fn push_value(query: &mut QueryBuilder<'static, Postgres>, value: &FieldValue) {
    match value {
        FieldValue::Uuid(v) => query.push_bind(*v),
        FieldValue::Text(v) => query.push_bind(v.clone()),
        FieldValue::Bool(v) => query.push_bind(*v),
        FieldValue::Timestamp(v) => query.push_bind(*v),
        FieldValue::Null => query.push("NULL"),
    };
}

fn push_order(query: &mut QueryBuilder<'static, Postgres>, sort: Sort) {
    query
        .push(" ORDER BY ")
        .push(sort.column)
        .push(" ")
        .push(sort.direction.as_sql())
        .push(", id ASC");
}

/// Maps unique violations to `RepositoryError::Conflict`
fn map_write_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let message = match db_err.constraint() {
                Some("users_email_key") => "Email already registered".to_string(),
                Some(constraint) => format!("Unique constraint violated: {}", constraint),
                None => "Unique constraint violated".to_string(),
            };
            return RepositoryError::Conflict(message);
        }
    }
    RepositoryError::Database(err)
}

/// Users table
#[derive(Clone)]
pub struct PgUserStore {
    repo: PgRepository<User>,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: PgRepository::new(pool),
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_one(&self, filter: Filter) -> Result<Option<User>, RepositoryError> {
        self.repo.find_one(&filter).await
    }

    async fn insert(&self, data: CreateUser) -> Result<User, RepositoryError> {
        let mut tx = self.repo.pool().begin().await?;

        let sql = format!(
            "INSERT INTO users (username, email, password_hash, role) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            User::COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&data.username)
            .bind(&data.email)
            .bind(&data.password_hash)
            .bind(data.role.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(map_write_error)?;

        tx.commit().await?;
        Ok(user)
    }

    async fn update(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, RepositoryError> {
        let mut query: QueryBuilder<'static, Postgres> =
            QueryBuilder::new("UPDATE users SET updated_at = NOW()");

        if let Some(username) = data.username {
            query.push(", username = ").push_bind(username);
        }
        if let Some(email) = data.email {
            query.push(", email = ").push_bind(email);
        }
        if let Some(password_hash) = data.password_hash {
            query.push(", password_hash = ").push_bind(password_hash);
        }
        if let Some(role) = data.role {
            query.push(", role = ").push_bind(role.as_str());
        }
        if let Some(refresh_token) = data.refresh_token {
            query.push(", refresh_token = ").push_bind(refresh_token);
        }
        if let Some(access_token) = data.access_token {
            query.push(", access_token = ").push_bind(access_token);
        }

        query
            .push(" WHERE deleted = FALSE AND id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(User::COLUMNS);

        let mut tx = self.repo.pool().begin().await?;
        let user = query
            .build_query_as::<User>()
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_write_error)?;
        tx.commit().await?;

        Ok(user)
    }

    async fn queries(&self, filter: Filter, sort: Sort) -> Result<Vec<User>, RepositoryError> {
        self.repo.queries(&filter, sort).await
    }

    async fn get_paging(
        &self,
        filter: Filter,
        page: PageRequest,
        sort: Sort,
    ) -> Result<Page<User>, RepositoryError> {
        self.repo.get_paging(&filter, page, sort).await
    }
}

/// Tasks table
#[derive(Clone)]
pub struct PgTaskStore {
    repo: PgRepository<Task>,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: PgRepository::new(pool),
        }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn find_one(&self, filter: Filter) -> Result<Option<Task>, RepositoryError> {
        self.repo.find_one(&filter).await
    }

    async fn insert(&self, data: CreateTask) -> Result<Task, RepositoryError> {
        let mut tx = self.repo.pool().begin().await?;

        let sql = format!(
            "INSERT INTO tasks (title, description, status, due_date, user_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            Task::COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(&data.title)
            .bind(&data.description)
            .bind(data.status.as_str())
            .bind(data.due_date)
            .bind(data.user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_write_error)?;

        tx.commit().await?;
        Ok(task)
    }

    async fn update(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, RepositoryError> {
        let mut query: QueryBuilder<'static, Postgres> =
            QueryBuilder::new("UPDATE tasks SET updated_at = NOW()");

        if let Some(title) = data.title {
            query.push(", title = ").push_bind(title);
        }
        if let Some(description) = data.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(status) = data.status {
            query.push(", status = ").push_bind(status.as_str());
        }
        if let Some(due_date) = data.due_date {
            query.push(", due_date = ").push_bind(due_date);
        }

        query
            .push(" WHERE deleted = FALSE AND id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(Task::COLUMNS);

        let mut tx = self.repo.pool().begin().await?;
        let task = query
            .build_query_as::<Task>()
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_write_error)?;
        tx.commit().await?;

        Ok(task)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        self.repo.soft_delete(&Filter::new().eq("id", id)).await
    }

    async fn get_paging(
        &self,
        filter: Filter,
        page: PageRequest,
        sort: Sort,
    ) -> Result<Page<Task>, RepositoryError> {
        self.repo.get_paging(&filter, page, sort).await
    }
}

/// Audits table
#[derive(Clone)]
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn insert(&self, data: CreateAudit) -> Result<AuditRecord, RepositoryError> {
        let record = sqlx::query_as::<_, AuditRecord>(
            r#"
            INSERT INTO audits (user_id, username, method, url, request_body, status_code, ip_address, correlation_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, username, method, url, request_body, status_code, ip_address, correlation_id, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.username)
        .bind(data.method)
        .bind(data.url)
        .bind(data.request_body)
        .bind(data.status_code)
        .bind(data.ip_address)
        .bind(data.correlation_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }
}

/// `SELECT 1` probe
#[derive(Clone)]
pub struct PgHealthCheck {
    pool: PgPool,
}

impl PgHealthCheck {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthCheck for PgHealthCheck {
    async fn ping(&self) -> Result<(), RepositoryError> {
        health_check(&self.pool).await?;
        Ok(())
    }
}
