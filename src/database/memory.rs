use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{FinancialRecord, NewRecord, NewUser, RecordType, User};
use crate::database::repository::{
    Page, Pagination, RecordFilter, RecordOrder, RecordStore, UserStore,
};

/// Process-local store used for development and tests. Records are kept in
/// insertion order, which doubles as the ordering tie-break.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<FinancialRecord>>,
    users: RwLock<Vec<User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matching records of a user sorted by `order`, newest insert first on ties.
    fn sorted<'a>(
        records: &'a [FinancialRecord],
        user_id: Uuid,
        filter: RecordFilter,
        order: RecordOrder,
    ) -> Vec<&'a FinancialRecord> {
        let mut matching: Vec<(usize, &FinancialRecord)> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.user_id == user_id && filter.matches(r))
            .collect();

        matching.sort_by(|(ia, a), (ib, b)| order.compare(a, b).then(ib.cmp(ia)));
        matching.into_iter().map(|(_, r)| r).collect()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create(&self, record: NewRecord) -> Result<FinancialRecord, DatabaseError> {
        let record = record.into_record(Utc::now())?;
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn create_many(&self, records: Vec<NewRecord>) -> Result<Vec<FinancialRecord>, DatabaseError> {
        let now = Utc::now();
        // Validate the whole batch before touching the data
        let records = records
            .into_iter()
            .map(|r| r.into_record(now))
            .collect::<Result<Vec<_>, _>>()?;

        self.records.write().await.extend(records.iter().cloned());
        Ok(records)
    }

    async fn find(
        &self,
        user_id: Uuid,
        filter: RecordFilter,
        pagination: Pagination,
    ) -> Result<Page<FinancialRecord>, DatabaseError> {
        let records = self.records.read().await;
        let matching = Self::sorted(&records, user_id, filter, RecordOrder::NEWEST_FIRST);

        let items = matching
            .iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit as usize)
            .map(|r| (*r).clone())
            .collect();

        Ok(Page {
            items,
            total: matching.len() as u64,
            page: pagination.page,
            limit: pagination.limit,
        })
    }

    async fn find_latest(
        &self,
        user_id: Uuid,
        record_type: RecordType,
        order: RecordOrder,
        limit: u32,
    ) -> Result<Vec<FinancialRecord>, DatabaseError> {
        let records = self.records.read().await;

        Ok(Self::sorted(&records, user_id, RecordFilter::of_type(record_type), order)
            .into_iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, user_id: Uuid, record_type: RecordType) -> Result<u64, DatabaseError> {
        let filter = RecordFilter::of_type(record_type);
        let records = self.records.read().await;

        Ok(records
            .iter()
            .filter(|r| r.user_id == user_id && filter.matches(r))
            .count() as u64)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut users = self.users.write().await;

        if users
            .iter()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            return Err(DatabaseError::Conflict("User already exists".to_string()));
        }

        let user = user.into_user(Utc::now());
        users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }
}
