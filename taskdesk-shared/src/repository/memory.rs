/// In-memory backend
///
/// Same filter, sort, paging and soft-delete semantics as the PostgreSQL
/// backend, over `RwLock<Vec<_>>`. Used by the test suites and for running
/// the API without a database.
///
/// # Example
///
/// ```
/// use taskdesk_shared::repository::memory::MemoryBackend;
///
/// let backend = MemoryBackend::new();
/// let stores = backend.stores();
/// assert!(backend.audits.records().is_empty());
/// # drop(stores);
/// ```

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::{
    AuditStore, Entity, Filter, HealthCheck, Page, PageRequest, RepositoryError, Sort, Stores,
    TaskStore, UserStore,
};
use crate::models::audit::{AuditRecord, CreateAudit};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User};

/// Generic table held in memory
pub struct MemoryRepository<E> {
    rows: RwLock<Vec<E>>,
    clock: Mutex<Option<DateTime<Utc>>>,
}

impl<E: Entity> Default for MemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> MemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            clock: Mutex::new(None),
        }
    }

    /// Current time, strictly increasing across calls
    ///
    /// Rows created back to back still get distinct `created_at` values, so
    /// the default `created_at DESC` order matches insertion order.
    pub fn now(&self) -> DateTime<Utc> {
        let mut last = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut now = Utc::now();
        if let Some(previous) = *last {
            if now <= previous {
                now = previous + Duration::microseconds(1);
            }
        }
        *last = Some(now);
        now
    }

    pub fn find_one(&self, filter: &Filter) -> Option<E> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        rows.iter().find(|row| filter.matches(*row)).cloned()
    }

    pub fn queries(&self, filter: &Filter, sort: Sort) -> Vec<E> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        let mut matching: Vec<E> = rows.iter().filter(|row| filter.matches(*row)).cloned().collect();
        matching.sort_by(|a, b| sort.compare(a, b));
        matching
    }

    pub fn count(&self, filter: &Filter) -> i64 {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        rows.iter().filter(|row| filter.matches(*row)).count() as i64
    }

    pub fn get_paging(&self, filter: &Filter, page: PageRequest, sort: Sort) -> Page<E> {
        let matching = self.queries(filter, sort);
        let total = matching.len() as i64;
        let rows = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Page::new(rows, total, page)
    }

    pub fn soft_delete(&self, filter: &Filter) -> bool {
        let now = self.now();
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        let mut affected = false;
        for row in rows.iter_mut().filter(|row| filter.matches(&**row)) {
            row.mark_deleted(now);
            affected = true;
        }
        affected
    }

    pub fn insert(&self, row: E) -> E {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        rows.push(row.clone());
        row
    }

    /// Inserts `row` unless a stored row, soft-deleted or not, clashes with it
    ///
    /// The check and the push happen under one write guard.
    pub fn insert_unique<C>(&self, row: E, clashes: C, message: &str) -> Result<E, RepositoryError>
    where
        C: Fn(&E) -> bool,
    {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        if rows.iter().any(|existing| clashes(existing)) {
            return Err(RepositoryError::Conflict(message.to_string()));
        }
        rows.push(row.clone());
        Ok(row)
    }

    /// Mutates the live row with the given id, returning the updated copy
    pub fn modify<F: FnOnce(&mut E)>(&self, id: Uuid, f: F) -> Option<E> {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        let row = rows
            .iter_mut()
            .find(|row| row.id() == id && !row.is_deleted())?;
        f(row);
        Some(row.clone())
    }

    /// Like [`MemoryRepository::modify`], but fails if another row clashes
    pub fn modify_unique<C, F>(
        &self,
        id: Uuid,
        clashes: C,
        message: &str,
        f: F,
    ) -> Result<Option<E>, RepositoryError>
    where
        C: Fn(&E) -> bool,
        F: FnOnce(&mut E),
    {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        if rows.iter().any(|row| row.id() != id && clashes(row)) {
            return Err(RepositoryError::Conflict(message.to_string()));
        }
        let Some(row) = rows
            .iter_mut()
            .find(|row| row.id() == id && !row.is_deleted())
        else {
            return Ok(None);
        };
        f(row);
        Ok(Some(row.clone()))
    }

    /// Every row, soft-deleted ones included
    pub fn all(&self) -> Vec<E> {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

const EMAIL_TAKEN: &str = "Email already registered";

/// Users held in memory
#[derive(Default)]
pub struct MemoryUserStore {
    repo: MemoryRepository<User>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored user, soft-deleted ones included
    pub fn all(&self) -> Vec<User> {
        self.repo.all()
    }

    /// Flags a user as deleted
    pub fn soft_delete(&self, id: Uuid) -> bool {
        self.repo.soft_delete(&Filter::new().eq("id", id))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_one(&self, filter: Filter) -> Result<Option<User>, RepositoryError> {
        Ok(self.repo.find_one(&filter))
    }

    async fn insert(&self, data: CreateUser) -> Result<User, RepositoryError> {
        let now = self.repo.now();
        let user = User {
            id: Uuid::new_v4(),
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            role: data.role,
            refresh_token: None,
            access_token: None,
            deleted: false,
            created_at: now,
            updated_at: now,
        };

        // Mirrors users_email_key, which covers soft-deleted rows as well
        let email = user.email.clone();
        self.repo.insert_unique(user, |u| u.email == email, EMAIL_TAKEN)
    }

    async fn update(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, RepositoryError> {
        let now = self.repo.now();
        let email = data.email.clone();
        self.repo.modify_unique(
            id,
            |u| email.as_deref() == Some(u.email.as_str()),
            EMAIL_TAKEN,
            |user| {
                data.apply(user);
                user.updated_at = now;
            },
        )
    }

    async fn queries(&self, filter: Filter, sort: Sort) -> Result<Vec<User>, RepositoryError> {
        Ok(self.repo.queries(&filter, sort))
    }

    async fn get_paging(
        &self,
        filter: Filter,
        page: PageRequest,
        sort: Sort,
    ) -> Result<Page<User>, RepositoryError> {
        Ok(self.repo.get_paging(&filter, page, sort))
    }
}

/// Tasks held in memory
#[derive(Default)]
pub struct MemoryTaskStore {
    repo: MemoryRepository<Task>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored task, soft-deleted ones included
    pub fn all(&self) -> Vec<Task> {
        self.repo.all()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn find_one(&self, filter: Filter) -> Result<Option<Task>, RepositoryError> {
        Ok(self.repo.find_one(&filter))
    }

    async fn insert(&self, data: CreateTask) -> Result<Task, RepositoryError> {
        let now = self.repo.now();
        Ok(self.repo.insert(Task {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            status: data.status,
            due_date: data.due_date,
            user_id: data.user_id,
            deleted: false,
            created_at: now,
            updated_at: now,
        }))
    }

    async fn update(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, RepositoryError> {
        let now = self.repo.now();
        Ok(self.repo.modify(id, |task| {
            data.apply(task);
            task.updated_at = now;
        }))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.repo.soft_delete(&Filter::new().eq("id", id)))
    }

    async fn get_paging(
        &self,
        filter: Filter,
        page: PageRequest,
        sort: Sort,
    ) -> Result<Page<Task>, RepositoryError> {
        Ok(self.repo.get_paging(&filter, page, sort))
    }
}

/// Audit rows held in memory
#[derive(Default)]
pub struct MemoryAuditStore {
    records: RwLock<Vec<AuditRecord>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn insert(&self, data: CreateAudit) -> Result<AuditRecord, RepositoryError> {
        let record = AuditRecord {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            username: data.username,
            method: data.method,
            url: data.url,
            request_body: data.request_body,
            status_code: data.status_code,
            ip_address: data.ip_address,
            correlation_id: data.correlation_id,
            created_at: Utc::now(),
        };
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(record)
    }
}

/// Always healthy
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryHealthCheck;

#[async_trait]
impl HealthCheck for MemoryHealthCheck {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Concrete in-memory stores, kept around so tests can inspect them
#[derive(Clone, Default)]
pub struct MemoryBackend {
    pub users: Arc<MemoryUserStore>,
    pub tasks: Arc<MemoryTaskStore>,
    pub audits: Arc<MemoryAuditStore>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stores(&self) -> Stores {
        Stores {
            users: self.users.clone(),
            tasks: self.tasks.clone(),
            audits: self.audits.clone(),
            health: Arc::new(MemoryHealthCheck),
        }
    }
}
