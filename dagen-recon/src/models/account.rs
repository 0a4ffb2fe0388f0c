//! Account activity (kind A)
//!
//! Money movement on an account. Identity is (merchant, type, activity
//! second, currency); there are no enrichment fields.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};

use dagen_common::hash::hash_str;
use dagen_common::{time, Error, Result};

use super::activity::{Activity, BatchKeyVersion};

/// Wire shape of one account advice line
#[derive(Debug, Deserialize)]
struct AccountAdviceLine {
    #[serde(rename = "AdviceFileName")]
    advice_file_name: String,
    #[serde(rename = "AdviceProvider")]
    advice_provider: String,
    #[serde(rename = "Version")]
    version: u32,
    #[serde(rename = "AccountActivityType")]
    account_activity_type: String,
    #[serde(rename = "DownloadedTime")]
    downloaded_time: String,
    #[serde(rename = "TimeStamp")]
    activity_time: String,
    #[serde(rename = "MerchantId")]
    merchant_id: String,
    #[serde(rename = "Currency")]
    currency: String,
    #[serde(rename = "Amount")]
    amount: f64,
}

/// Account activity data model
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct AccountActivity {
    pub batch_name: String,
    pub provider: String,
    pub version: u32,
    pub activity_type: String,
    pub activity_time: DateTime<Utc>,
    pub merchant_id: String,
    pub currency: String,
    pub amount: f64,
    pub downloaded_time: DateTime<Utc>,
    pub last_modified_time: DateTime<Utc>,
}

#[async_trait]
impl Activity for AccountActivity {
    const KIND: &'static str = "account";
    const FILE_EXT: &'static str = ".aac";

    fn parse_line(line: &str) -> Result<Self> {
        let raw: AccountAdviceLine = serde_json::from_str(line)
            .map_err(|e| Error::Parse(format!("malformed account advice record: {e}")))?;
        Ok(Self {
            batch_name: raw.advice_file_name,
            provider: raw.advice_provider,
            version: raw.version,
            activity_type: raw.account_activity_type,
            activity_time: time::parse_timestamp(&raw.activity_time)?,
            merchant_id: raw.merchant_id,
            currency: raw.currency,
            amount: raw.amount,
            downloaded_time: time::parse_timestamp(&raw.downloaded_time)?,
            last_modified_time: time::now(),
        })
    }

    fn semantic_hash(&self) -> u32 {
        hash_str(&format!(
            "{}-{}-{}-{}",
            self.merchant_id,
            self.activity_type,
            self.activity_time.timestamp(),
            self.currency,
        ))
    }

    fn batch_name(&self) -> &str {
        &self.batch_name
    }

    fn provider(&self) -> &str {
        &self.provider
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn activity_time(&self) -> DateTime<Utc> {
        self.activity_time
    }

    fn activity_type(&self) -> &str {
        &self.activity_type
    }

    fn category_id(&self) -> &str {
        &self.merchant_id
    }

    fn amount(&self) -> f64 {
        self.amount
    }

    fn set_amount(&mut self, amount: f64) {
        self.amount = amount;
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified_time
    }

    fn set_last_modified(&mut self, at: DateTime<Utc>) {
        self.last_modified_time = at;
    }

    async fn insert(conn: &mut SqliteConnection, record: &Self) -> Result<()> {
        sqlx::query(
            "INSERT INTO account_activity
                (batch_name, provider, version, activity_type, activity_time,
                 merchant_id, currency, amount, downloaded_time, last_modified_time)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.batch_name)
        .bind(&record.provider)
        .bind(record.version)
        .bind(&record.activity_type)
        .bind(record.activity_time)
        .bind(&record.merchant_id)
        .bind(&record.currency)
        .bind(record.amount)
        .bind(record.downloaded_time)
        .bind(record.last_modified_time)
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn fetch_version(
        pool: &SqlitePool,
        batch_name: &str,
        provider: &str,
        version: u32,
    ) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, Self>(
            "SELECT batch_name, provider, version, activity_type, activity_time,
                    merchant_id, currency, amount, downloaded_time, last_modified_time
             FROM account_activity
             WHERE batch_name = ? AND provider = ? AND version = ?",
        )
        .bind(batch_name)
        .bind(provider)
        .bind(version)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    async fn fetch_history(
        pool: &SqlitePool,
        batch_name: &str,
        provider: &str,
    ) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, Self>(
            "SELECT batch_name, provider, version, activity_type, activity_time,
                    merchant_id, currency, amount, downloaded_time, last_modified_time
             FROM account_activity
             WHERE batch_name = ? AND provider = ?
             ORDER BY version DESC",
        )
        .bind(batch_name)
        .bind(provider)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    async fn count(pool: &SqlitePool, batch_name: &str, provider: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM account_activity WHERE batch_name = ? AND provider = ?",
        )
        .bind(batch_name)
        .bind(provider)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    async fn max_versions(pool: &SqlitePool) -> Result<Vec<BatchKeyVersion>> {
        let rows = sqlx::query_as::<_, BatchKeyVersion>(
            "SELECT batch_name, provider, MAX(version) AS version
             FROM account_activity
             GROUP BY batch_name, provider",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advice_line(merchant: &str, amount: f64) -> String {
        format!(
            r#"{{"AdviceFileName":"fee-20260301","AdviceProvider":"acq1","Version":3,"AccountActivityType":"Fee","DownloadedTime":"2026-03-01T04:00:00Z","TimeStamp":"2026-03-01T03:59:10.000-00:00","MerchantId":"{merchant}","Currency":"USD","Amount":{amount}}}"#
        )
    }

    #[test]
    fn parses_advice_line() {
        let act = AccountActivity::parse_line(&advice_line("M77", 12.5)).unwrap();
        assert_eq!(act.batch_name, "fee-20260301");
        assert_eq!(act.provider, "acq1");
        assert_eq!(act.version, 3);
        assert_eq!(act.activity_type, "Fee");
        assert_eq!(act.merchant_id, "M77");
        assert_eq!(act.amount, 12.5);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(AccountActivity::parse_line("{not json").is_err());
    }

    #[test]
    fn rejects_unparseable_timestamp() {
        let line = advice_line("M77", 1.0).replace("2026-03-01T03:59:10.000-00:00", "yesterday");
        assert!(AccountActivity::parse_line(&line).is_err());
    }

    #[test]
    fn trait_accessors_expose_fields() {
        let act = AccountActivity::parse_line(&advice_line("M77", 12.5)).unwrap();
        assert_eq!(Activity::batch_name(&act), "fee-20260301");
        assert_eq!(Activity::provider(&act), "acq1");
        assert_eq!(Activity::version(&act), 3);
        assert_eq!(Activity::activity_type(&act), "Fee");
        assert_eq!(Activity::category_id(&act), "M77");
        assert_eq!(Activity::amount(&act), 12.5);
        assert_eq!(Activity::activity_time(&act), act.activity_time);
        assert_eq!(Activity::last_modified(&act), act.last_modified_time);
    }

    #[test]
    fn hash_ignores_amount_and_version() {
        let a = AccountActivity::parse_line(&advice_line("M77", 12.5)).unwrap();
        let b = AccountActivity::parse_line(&advice_line("M77", 99.0)).unwrap();
        assert_eq!(a.semantic_hash(), b.semantic_hash());
    }

    #[test]
    fn hash_differs_per_identity_field() {
        let base = AccountActivity::parse_line(&advice_line("M77", 1.0)).unwrap();

        let mut other = base.clone();
        other.merchant_id = "M78".into();
        assert_ne!(base.semantic_hash(), other.semantic_hash());

        let mut other = base.clone();
        other.activity_type = "Adjustment".into();
        assert_ne!(base.semantic_hash(), other.semantic_hash());

        let mut other = base.clone();
        other.activity_time = other.activity_time + chrono::Duration::seconds(1);
        assert_ne!(base.semantic_hash(), other.semantic_hash());

        let mut other = base.clone();
        other.currency = "EUR".into();
        assert_ne!(base.semantic_hash(), other.semantic_hash());
    }
}
