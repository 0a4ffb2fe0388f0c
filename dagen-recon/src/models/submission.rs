//! Submission activity (kind B)
//!
//! A transaction submission, enriched with seller, partner and internal
//! reference attributes resolved from the reference transactions. The
//! enrichment fields are part of the record's identity, so enrichment runs
//! during load, before the semantic hash is taken. A reference miss leaves
//! the fields empty rather than failing the load.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};

use dagen_common::hash::hash_str;
use dagen_common::{time, Error, Result};

use super::activity::{Activity, BatchKeyVersion};
use crate::cache::EnrichmentContext;

/// Wire shape of one submission advice line
#[derive(Debug, Deserialize)]
struct SubmissionAdviceLine {
    #[serde(rename = "AdviceFileName")]
    advice_file_name: String,
    #[serde(rename = "AdviceProvider")]
    advice_provider: String,
    #[serde(rename = "Version")]
    version: u32,
    #[serde(rename = "TransactionType")]
    transaction_type: String,
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
    #[serde(rename = "MerchantReferenceNumber")]
    merchant_reference_number: String,
}

/// Submission activity data model
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SubmissionActivity {
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
    pub merchant_reference_number: String,
    pub internal_mrn: String,
    pub seller_of_record: String,
    pub partner: String,
}

#[async_trait]
impl Activity for SubmissionActivity {
    const KIND: &'static str = "submission";
    const FILE_EXT: &'static str = ".sac";

    fn parse_line(line: &str) -> Result<Self> {
        let raw: SubmissionAdviceLine = serde_json::from_str(line)
            .map_err(|e| Error::Parse(format!("malformed submission advice record: {e}")))?;
        Ok(Self {
            batch_name: raw.advice_file_name,
            provider: raw.advice_provider,
            version: raw.version,
            activity_type: raw.transaction_type,
            activity_time: time::parse_timestamp(&raw.activity_time)?,
            merchant_id: raw.merchant_id,
            currency: raw.currency,
            amount: raw.amount,
            downloaded_time: time::parse_timestamp(&raw.downloaded_time)?,
            last_modified_time: time::now(),
            merchant_reference_number: raw.merchant_reference_number,
            internal_mrn: String::new(),
            seller_of_record: String::new(),
            partner: String::new(),
        })
    }

    async fn enrich(&mut self, ctx: &EnrichmentContext) -> Result<()> {
        if let Some(attrs) = ctx
            .lookup(&self.merchant_reference_number, &self.activity_type)
            .await?
        {
            self.internal_mrn = attrs.internal_mrn;
            self.seller_of_record = attrs.seller_of_record;
            self.partner = attrs.partner;
        }
        Ok(())
    }

    fn semantic_hash(&self) -> u32 {
        hash_str(&format!(
            "{}-{}-{}-{}-{}-{}-{}-{}",
            self.merchant_reference_number,
            self.merchant_id,
            self.activity_type,
            self.activity_time.timestamp(),
            self.currency,
            self.internal_mrn,
            self.seller_of_record,
            self.partner,
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
            "INSERT INTO submission_activity
                (batch_name, provider, version, activity_type, activity_time,
                 merchant_id, currency, amount, downloaded_time, last_modified_time,
                 merchant_reference_number, internal_mrn, seller_of_record, partner)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
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
        .bind(&record.merchant_reference_number)
        .bind(&record.internal_mrn)
        .bind(&record.seller_of_record)
        .bind(&record.partner)
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
                    merchant_id, currency, amount, downloaded_time, last_modified_time,
                    merchant_reference_number, internal_mrn, seller_of_record, partner
             FROM submission_activity
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
                    merchant_id, currency, amount, downloaded_time, last_modified_time,
                    merchant_reference_number, internal_mrn, seller_of_record, partner
             FROM submission_activity
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
            "SELECT COUNT(*) FROM submission_activity WHERE batch_name = ? AND provider = ?",
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
             FROM submission_activity
             GROUP BY batch_name, provider",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}
