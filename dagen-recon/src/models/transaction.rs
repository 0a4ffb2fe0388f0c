//! Reference transactions
//!
//! Bulk-ingested from CSV drops and joined onto submission activity by
//! (merchant reference number, activity type) to fill in the seller,
//! partner and internal reference attributes.

use sqlx::SqlitePool;

use dagen_common::{Error, Result};

/// One reference transaction row
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TransactionRecord {
    pub mrn: String,
    pub activity_type: String,
    pub internal_mrn: String,
    pub seller_of_record: String,
    pub partner: String,
    pub recorded_on: String,
}

/// The attributes a transaction contributes to a submission record
#[derive(Debug, Clone, PartialEq)]
pub struct TxAttributes {
    pub internal_mrn: String,
    pub seller_of_record: String,
    pub partner: String,
}

/// Map a transaction type code from the CSV feed onto the activity type
/// names used by submission records. Unknown codes keep their decimal
/// spelling so an unmapped feed still enriches consistently.
pub fn activity_type_from_code(code: &str) -> String {
    match code.trim() {
        "1" => "Sale".to_string(),
        "2" => "Refund".to_string(),
        "3" => "Chargeback".to_string(),
        "4" => "Adjustment".to_string(),
        other => other.to_string(),
    }
}

impl TransactionRecord {
    /// Decode one CSV row. Columns, in fixed order: merchant reference
    /// number, transaction type code, internal reference (empty means same
    /// as the merchant reference number), seller of record, partner id,
    /// date.
    pub fn from_csv_row(row: &csv::StringRecord) -> Result<Self> {
        if row.len() < 6 {
            return Err(Error::Parse(format!(
                "transaction row has {} columns, expected 6",
                row.len()
            )));
        }

        let mrn = row[0].trim().to_string();
        if mrn.is_empty() {
            return Err(Error::Parse("transaction row has empty merchant reference".into()));
        }

        let internal = row[2].trim();
        let internal_mrn = if internal.is_empty() {
            mrn.clone()
        } else {
            internal.to_string()
        };

        Ok(Self {
            activity_type: activity_type_from_code(&row[1]),
            internal_mrn,
            seller_of_record: row[3].trim().to_string(),
            partner: row[4].trim().to_string(),
            recorded_on: row[5].trim().to_string(),
            mrn,
        })
    }

    /// The enrichment attributes carried by this transaction
    pub fn attributes(&self) -> TxAttributes {
        TxAttributes {
            internal_mrn: self.internal_mrn.clone(),
            seller_of_record: self.seller_of_record.clone(),
            partner: self.partner.clone(),
        }
    }

    /// Most recently ingested transaction for an enrichment key
    pub async fn find_by_key(
        pool: &SqlitePool,
        mrn: &str,
        activity_type: &str,
    ) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, Self>(
            "SELECT mrn, activity_type, internal_mrn, seller_of_record, partner, recorded_on
             FROM transactions
             WHERE mrn = ? AND activity_type = ?
             ORDER BY id DESC
             LIMIT 1",
        )
        .bind(mrn)
        .bind(activity_type)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    /// Insert a chunk of rows in one transaction
    pub async fn insert_chunk(pool: &SqlitePool, rows: &[Self]) -> Result<()> {
        let mut tx = pool.begin().await?;
        for row in rows {
            sqlx::query(
                "INSERT INTO transactions
                    (mrn, activity_type, internal_mrn, seller_of_record, partner, recorded_on)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&row.mrn)
            .bind(&row.activity_type)
            .bind(&row.internal_mrn)
            .bind(&row.seller_of_record)
            .bind(&row.partner)
            .bind(&row.recorded_on)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
