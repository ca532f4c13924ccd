use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{
    FinancialRecord, Metadata, NewRecord, NewUser, RecordKind, RecordType, User,
};
use crate::database::repository::{
    Page, Pagination, RecordFilter, RecordOrder, RecordStore, UserStore,
};

const RECORD_COLUMNS: &str = "id, user_id, record_type, amount, payee, purpose, due_date, \
     balance_amount, file_name, uploaded_at, metadata";

/// Flat row shape of `financial_records`; variant rules are re-checked when
/// converting back into a [FinancialRecord].
#[derive(Debug, FromRow)]
struct RecordRow {
    id: Uuid,
    user_id: Uuid,
    record_type: String,
    amount: Option<Decimal>,
    payee: Option<String>,
    purpose: Option<String>,
    due_date: Option<NaiveDate>,
    balance_amount: Option<Decimal>,
    file_name: Option<String>,
    uploaded_at: DateTime<Utc>,
    metadata: Json<Metadata>,
}

impl From<&FinancialRecord> for RecordRow {
    fn from(record: &FinancialRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            record_type: record.record_type().as_str().to_string(),
            amount: record.amount(),
            payee: record.payee().map(str::to_string),
            purpose: record.purpose().map(str::to_string),
            due_date: record.due_date(),
            balance_amount: record.balance_amount(),
            file_name: record.file_name.clone(),
            uploaded_at: record.uploaded_at,
            metadata: Json(record.metadata.clone()),
        }
    }
}

impl TryFrom<RecordRow> for FinancialRecord {
    type Error = DatabaseError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str| DatabaseError::Corrupt(format!("record {} has no {}", row.id, field));

        let record_type: RecordType = row.record_type.parse()?;
        let kind = match record_type {
            RecordType::Invoice => RecordKind::Invoice {
                amount: row.amount.ok_or_else(|| corrupt("amount"))?,
                payee: row.payee.clone().ok_or_else(|| corrupt("payee"))?,
                purpose: row.purpose.clone().ok_or_else(|| corrupt("purpose"))?,
                due_date: row.due_date.ok_or_else(|| corrupt("due_date"))?,
            },
            RecordType::Balance => RecordKind::Balance {
                balance_amount: row.balance_amount.ok_or_else(|| corrupt("balance_amount"))?,
            },
            RecordType::Transaction => RecordKind::Transaction {
                amount: row.amount.ok_or_else(|| corrupt("amount"))?,
                payee: row.payee.clone(),
                purpose: row.purpose.clone(),
            },
        };

        Ok(FinancialRecord {
            id: row.id,
            user_id: row.user_id,
            kind,
            file_name: row.file_name,
            uploaded_at: row.uploaded_at,
            metadata: row.metadata.0,
        })
    }
}

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with the configured limits and bring the schema up to date.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::connect(config).await?;
        DatabaseManager::migrate(&pool).await?;
        Ok(Self::new(pool))
    }

    async fn insert<'e, E>(executor: E, record: &FinancialRecord) -> Result<(), DatabaseError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let row = RecordRow::from(record);
        sqlx::query(&format!(
            "INSERT INTO financial_records ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            RECORD_COLUMNS
        ))
        .bind(row.id)
        .bind(row.user_id)
        .bind(row.record_type)
        .bind(row.amount)
        .bind(row.payee)
        .bind(row.purpose)
        .bind(row.due_date)
        .bind(row.balance_amount)
        .bind(row.file_name)
        .bind(row.uploaded_at)
        .bind(row.metadata)
        .execute(executor)
        .await?;
        Ok(())
    }

    fn record_type_param(filter: RecordFilter) -> Option<&'static str> {
        filter.record_type.map(|t| t.as_str())
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn create(&self, record: NewRecord) -> Result<FinancialRecord, DatabaseError> {
        let record = record.into_record(Utc::now())?;
        Self::insert(&self.pool, &record).await?;
        Ok(record)
    }

    async fn create_many(&self, records: Vec<NewRecord>) -> Result<Vec<FinancialRecord>, DatabaseError> {
        let now = Utc::now();
        let records = records
            .into_iter()
            .map(|r| r.into_record(now))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self.pool.begin().await?;
        for record in &records {
            Self::insert(&mut *tx, record).await?;
        }
        tx.commit().await?;

        Ok(records)
    }

    async fn find(
        &self,
        user_id: Uuid,
        filter: RecordFilter,
        pagination: Pagination,
    ) -> Result<Page<FinancialRecord>, DatabaseError> {
        let record_type = Self::record_type_param(filter);

        let rows = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {} FROM financial_records \
             WHERE user_id = $1 AND ($2::TEXT IS NULL OR record_type = $2) \
             {} LIMIT $3 OFFSET $4",
            RECORD_COLUMNS,
            RecordOrder::NEWEST_FIRST.to_sql()
        ))
        .bind(user_id)
        .bind(record_type)
        .bind(i64::from(pagination.limit))
        .bind(pagination.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM financial_records \
             WHERE user_id = $1 AND ($2::TEXT IS NULL OR record_type = $2)",
        )
        .bind(user_id)
        .bind(record_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(Page {
            items: rows
                .into_iter()
                .map(FinancialRecord::try_from)
                .collect::<Result<_, _>>()?,
            total: total.max(0) as u64,
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
        let rows = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {} FROM financial_records WHERE user_id = $1 AND record_type = $2 {} LIMIT $3",
            RECORD_COLUMNS,
            order.to_sql()
        ))
        .bind(user_id)
        .bind(record_type.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(FinancialRecord::try_from).collect()
    }

    async fn count(&self, user_id: Uuid, record_type: RecordType) -> Result<u64, DatabaseError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM financial_records WHERE user_id = $1 AND record_type = $2",
        )
        .bind(user_id)
        .bind(record_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let user = user.into_user(Utc::now());

        let result = sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DatabaseError::Conflict("User already exists".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::MetaValue;

    fn invoice_record() -> FinancialRecord {
        NewRecord::new(
            Uuid::new_v4(),
            RecordKind::Invoice {
                amount: Decimal::new(12050, 2),
                payee: "ACME".to_string(),
                purpose: "hosting".to_string(),
                due_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            },
        )
        .metadata(Metadata::new().with("source", "invoice_upload"))
        .into_record(Utc::now())
        .unwrap()
    }

    #[test]
    fn rows_round_trip_through_the_flat_shape() {
        let record = invoice_record();

        let row = RecordRow::from(&record);
        assert_eq!(row.record_type, "INVOICE");
        assert_eq!(row.balance_amount, None);

        let restored = FinancialRecord::try_from(row).unwrap();
        assert_eq!(restored, record);
        assert_eq!(
            restored.metadata.get("source"),
            Some(&MetaValue::Text("invoice_upload".to_string()))
        );
    }

    #[test]
    fn invoice_row_without_due_date_is_corrupt() {
        let mut row = RecordRow::from(&invoice_record());
        row.due_date = None;

        assert!(matches!(
            FinancialRecord::try_from(row),
            Err(DatabaseError::Corrupt(_))
        ));
    }

    #[test]
    fn unknown_record_type_is_rejected() {
        let mut row = RecordRow::from(&invoice_record());
        row.record_type = "RECEIPT".to_string();

        assert!(matches!(
            FinancialRecord::try_from(row),
            Err(DatabaseError::Validation(_))
        ));
    }
}
