/// Generic repository layer
///
/// Every table in TaskDesk is read through the same small vocabulary:
///
/// - [`Filter`]: AND-ed equality and case-insensitive substring conditions
/// - [`Sort`]: a whitelisted column plus direction (default `created_at DESC`)
/// - [`PageRequest`] / [`Page`]: 1-based paging with total row and page counts
///
/// Soft-deleted rows (`deleted = TRUE`) are excluded by every backend. Callers
/// cannot opt out of that condition.
///
/// # Backends
///
/// - [`postgres`]: sqlx `QueryBuilder` over a `PgPool`
/// - [`memory`]: in-process vectors with identical filter/sort/paging semantics
///
/// Services depend only on the store traits ([`UserStore`], [`TaskStore`],
/// [`AuditStore`], [`HealthCheck`]), bundled together as [`Stores`].
///
/// # Example
///
/// ```
/// use taskdesk_shared::repository::{Filter, PageRequest, Sort, SortDirection};
/// use uuid::Uuid;
///
/// let owner = Uuid::new_v4();
/// let filter = Filter::new().eq("user_id", owner).ilike("title", "report");
/// let page = PageRequest::new(Some(2), Some(10)).unwrap();
/// let sort = Sort::new("due_date", SortDirection::Asc);
///
/// assert_eq!(filter.conditions().len(), 2);
/// assert_eq!(page.offset(), 10);
/// assert_eq!(sort.column, "due_date");
/// ```

pub mod memory;
pub mod postgres;

use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::models::audit::{AuditRecord, CreateAudit};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User};

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unique constraint violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Query parameters were rejected before reaching the database
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// A single column value, used both for binding filter parameters and for
/// evaluating filters against in-memory rows
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Uuid(Uuid),
    Text(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Null,
}

impl FieldValue {
    /// Total order used by the in-memory backend when sorting
    ///
    /// NULL sorts first, mirroring `NULLS FIRST` for ascending order.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Uuid(a), FieldValue::Uuid(b)) => a.cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a.cmp(b),
            (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
            (FieldValue::Null, _) => Ordering::Less,
            (_, FieldValue::Null) => Ordering::Greater,
            _ => Ordering::Equal,
        }
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Uuid(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// A persisted row type the generic repository can work with
///
/// Column names handed to [`Filter`] and [`Sort`] are `&'static str` so they
/// can only come from code, never from request input. Request-supplied sort
/// fields go through [`Entity::sort_column`] first.
pub trait Entity:
    Clone + Send + Sync + Unpin + 'static + for<'r> sqlx::FromRow<'r, PgRow>
{
    /// Table name
    const TABLE: &'static str;

    /// Comma-separated select list (also used for `RETURNING`)
    const COLUMNS: &'static str;

    /// Primary key
    fn id(&self) -> Uuid;

    /// Soft-delete flag
    fn is_deleted(&self) -> bool;

    /// Flips the soft-delete flag (in-memory backend only)
    fn mark_deleted(&mut self, at: DateTime<Utc>);

    /// Looks up a column value by name
    fn field(&self, column: &str) -> Option<FieldValue>;

    /// Maps an API-facing field name (e.g. `dueDate`) to a sortable column
    fn sort_column(_field: &str) -> Option<&'static str> {
        None
    }
}

/// A single filter condition
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column = value` (`IS NULL` for [`FieldValue::Null`])
    Eq {
        column: &'static str,
        value: FieldValue,
    },

    /// `column ILIKE '%needle%'`, with LIKE metacharacters in the needle escaped
    ILike {
        column: &'static str,
        needle: String,
    },
}

impl Condition {
    fn matches<E: Entity>(&self, entity: &E) -> bool {
        match self {
            Condition::Eq { column, value } => {
                entity.field(column).unwrap_or(FieldValue::Null) == *value
            }
            Condition::ILike { column, needle } => match entity.field(column) {
                Some(FieldValue::Text(text)) => {
                    text.to_lowercase().contains(&needle.to_lowercase())
                }
                _ => false,
            },
        }
    }
}

/// AND-ed set of conditions
///
/// The soft-delete condition is not part of the filter. Backends always
/// add it themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Creates an empty filter (matches every live row)
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality condition
    pub fn eq(mut self, column: &'static str, value: impl Into<FieldValue>) -> Self {
        self.conditions.push(Condition::Eq {
            column,
            value: value.into(),
        });
        self
    }

    /// Adds a case-insensitive substring condition
    pub fn ilike(mut self, column: &'static str, needle: impl Into<String>) -> Self {
        self.conditions.push(Condition::ILike {
            column,
            needle: needle.into(),
        });
        self
    }

    /// Returns the conditions in insertion order
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Evaluates the filter against a row, soft-delete flag included
    pub fn matches<E: Entity>(&self, entity: &E) -> bool {
        !entity.is_deleted() && self.conditions.iter().all(|c| c.matches(entity))
    }
}

/// Escapes `\`, `%` and `_` so a needle is matched literally inside `ILIKE`
pub fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(RepositoryError::InvalidQuery(format!(
                "Invalid sort direction '{}', expected ASC or DESC",
                s
            )))
        }
    }
}

/// Ordering for list queries
///
/// `id ASC` is always appended as a tiebreaker so that page boundaries are
/// stable between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: &'static str,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(column: &'static str, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    /// Resolves an API field name against the entity's sort whitelist
    pub fn for_field<E: Entity>(
        field: &str,
        direction: SortDirection,
    ) -> Result<Self, RepositoryError> {
        E::sort_column(field)
            .map(|column| Self::new(column, direction))
            .ok_or_else(|| {
                RepositoryError::InvalidQuery(format!("Cannot sort by '{}'", field))
            })
    }

    /// Compares two rows the way `ORDER BY column dir, id ASC` would
    pub fn compare<E: Entity>(&self, a: &E, b: &E) -> Ordering {
        let left = a.field(self.column).unwrap_or(FieldValue::Null);
        let right = b.field(self.column).unwrap_or(FieldValue::Null);

        let primary = match self.direction {
            SortDirection::Asc => left.compare(&right),
            SortDirection::Desc => right.compare(&left),
        };

        primary.then_with(|| a.id().cmp(&b.id()))
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::new("created_at", SortDirection::Desc)
    }
}

/// 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    /// Builds a page request, applying defaults for missing values
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidQuery` if `page` is 0, or `limit` is 0
    /// or above [`PageRequest::MAX_LIMIT`].
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self, RepositoryError> {
        let page = page.unwrap_or(Self::DEFAULT_PAGE);
        let limit = limit.unwrap_or(Self::DEFAULT_LIMIT);

        if page == 0 {
            return Err(RepositoryError::InvalidQuery(
                "page must be at least 1".to_string(),
            ));
        }
        if limit == 0 || limit > Self::MAX_LIMIT {
            return Err(RepositoryError::InvalidQuery(format!(
                "limit must be between 1 and {}",
                Self::MAX_LIMIT
            )));
        }

        Ok(Self { page, limit })
    }

    /// Number of rows to skip
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: Self::DEFAULT_PAGE,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// One page of results plus totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Rows on this page
    pub data_paging: Vec<T>,

    /// Requested page size
    pub per_page: u32,

    /// Total number of matching rows
    pub total_data: i64,

    /// `ceil(total_data / per_page)`
    pub total_page: i64,

    /// 1-based page number
    pub current_page: u32,
}

impl<T> Page<T> {
    pub fn new(data_paging: Vec<T>, total_data: i64, request: PageRequest) -> Self {
        Self {
            data_paging,
            per_page: request.limit,
            total_data,
            total_page: total_pages(total_data, request.limit),
            current_page: request.page,
        }
    }

    /// Converts the rows while keeping the totals
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            data_paging: self.data_paging.into_iter().map(f).collect(),
            per_page: self.per_page,
            total_data: self.total_data,
            total_page: self.total_page,
            current_page: self.current_page,
        }
    }
}

/// Ceiling division of rows by page size (0 rows means 0 pages)
pub fn total_pages(total_data: i64, limit: u32) -> i64 {
    if limit == 0 || total_data <= 0 {
        return 0;
    }
    let limit = i64::from(limit);
    (total_data + limit - 1) / limit
}

/// User persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    /// First live user matching the filter
    async fn find_one(&self, filter: Filter) -> Result<Option<User>, RepositoryError>;

    /// Inserts a user
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    async fn insert(&self, data: CreateUser) -> Result<User, RepositoryError>;

    /// Applies a partial update to a live user
    async fn update(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, RepositoryError>;

    /// Every live user matching the filter, unpaged
    async fn queries(&self, filter: Filter, sort: Sort) -> Result<Vec<User>, RepositoryError>;

    /// Pages through live users
    async fn get_paging(
        &self,
        filter: Filter,
        page: PageRequest,
        sort: Sort,
    ) -> Result<Page<User>, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        self.find_one(Filter::new().eq("id", id)).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.find_one(Filter::new().eq("email", email)).await
    }
}

/// Task persistence
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// First live task matching the filter
    async fn find_one(&self, filter: Filter) -> Result<Option<Task>, RepositoryError>;

    /// Inserts a task
    async fn insert(&self, data: CreateTask) -> Result<Task, RepositoryError>;

    /// Applies a partial update to a live task
    async fn update(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, RepositoryError>;

    /// Flips the soft-delete flag, returning false if no live row matched
    async fn soft_delete(&self, id: Uuid) -> Result<bool, RepositoryError>;

    /// Pages through live tasks
    async fn get_paging(
        &self,
        filter: Filter,
        page: PageRequest,
        sort: Sort,
    ) -> Result<Page<Task>, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, RepositoryError> {
        self.find_one(Filter::new().eq("id", id)).await
    }
}

/// Append-only audit trail
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn insert(&self, data: CreateAudit) -> Result<AuditRecord, RepositoryError>;
}

/// Backend liveness probe
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// The full set of stores the services run against
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub audits: Arc<dyn AuditStore>,
    pub health: Arc<dyn HealthCheck>,
}

impl Stores {
    /// Postgres-backed stores sharing one pool
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            users: Arc::new(postgres::PgUserStore::new(pool.clone())),
            tasks: Arc::new(postgres::PgTaskStore::new(pool.clone())),
            audits: Arc::new(postgres::PgAuditStore::new(pool.clone())),
            health: Arc::new(postgres::PgHealthCheck::new(pool)),
        }
    }
}
