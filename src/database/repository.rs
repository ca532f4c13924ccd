use std::cmp::Ordering;

use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{FinancialRecord, NewRecord, NewUser, RecordType, User};

/// Optional narrowing of a record listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub record_type: Option<RecordType>,
}

impl RecordFilter {
    pub fn of_type(record_type: RecordType) -> Self {
        Self {
            record_type: Some(record_type),
        }
    }

    pub fn matches(&self, record: &FinancialRecord) -> bool {
        self.record_type
            .map_or(true, |record_type| record.record_type() == record_type)
    }
}

/// One-indexed offset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    /// Pages below 1 become 1 and the limit is clamped to `1..=max_limit`.
    pub fn new(page: u32, limit: u32, max_limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, max_limit.max(1)),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// A slice of results plus what is needed to render a pagination block.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn empty(pagination: Pagination) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: pagination.page,
            limit: pagination.limit,
        }
    }

    /// `ceil(total / limit)`
    pub fn pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.limit.max(1)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    UploadedAt,
    DueDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Caller-chosen ordering for `find_latest`. Ties are broken by insertion
/// order, newest insert first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl RecordOrder {
    pub const NEWEST_FIRST: RecordOrder = RecordOrder {
        field: SortField::UploadedAt,
        direction: SortDirection::Desc,
    };

    pub const SOONEST_DUE: RecordOrder = RecordOrder {
        field: SortField::DueDate,
        direction: SortDirection::Asc,
    };

    pub fn to_sql(&self) -> String {
        let column = match self.field {
            SortField::UploadedAt => "uploaded_at",
            SortField::DueDate => "due_date",
        };
        format!("ORDER BY {} {} NULLS LAST, seq DESC", column, self.direction.to_sql())
    }

    /// Compare two records on the sort field only. Records without the field
    /// (e.g. a due date on a balance) sort last in either direction.
    pub fn compare(&self, a: &FinancialRecord, b: &FinancialRecord) -> Ordering {
        let ordering = match self.field {
            SortField::UploadedAt => Some(a.uploaded_at.cmp(&b.uploaded_at)),
            SortField::DueDate => match (a.due_date(), b.due_date()) {
                (Some(x), Some(y)) => Some(x.cmp(&y)),
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => None,
            },
        };

        match (ordering, self.direction) {
            (Some(ordering), SortDirection::Asc) => ordering,
            (Some(ordering), SortDirection::Desc) => ordering.reverse(),
            (None, _) => Ordering::Equal,
        }
    }
}

/// Validated persistence of financial records, always scoped to one user.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Validate and persist a single record.
    async fn create(&self, record: NewRecord) -> Result<FinancialRecord, DatabaseError>;

    /// Validate every record, then persist all of them or none.
    async fn create_many(&self, records: Vec<NewRecord>) -> Result<Vec<FinancialRecord>, DatabaseError>;

    /// Newest-first page of a user's records.
    async fn find(
        &self,
        user_id: Uuid,
        filter: RecordFilter,
        pagination: Pagination,
    ) -> Result<Page<FinancialRecord>, DatabaseError>;

    /// Up to `limit` records of one type in the requested order.
    async fn find_latest(
        &self,
        user_id: Uuid,
        record_type: RecordType,
        order: RecordOrder,
        limit: u32,
    ) -> Result<Vec<FinancialRecord>, DatabaseError>;

    async fn count(&self, user_id: Uuid, record_type: RecordType) -> Result<u64, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [DatabaseError::Conflict] when the email or username is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;
}

/// Everything the HTTP layer needs from a backend.
pub trait Store: RecordStore + UserStore {}

impl<T: RecordStore + UserStore> Store for T {}
