use anyhow::Result;
use sqlx::{Pool, Sqlite};

use crate::currency::Currency;
use crate::database::db::queries::{self, TxnScope};
use crate::database::models::TransactionDetail;
use crate::transparency::{self, PortalOverview, PortalQuery, PortalSettings};

/// Read-only view of the store used by the dashboard.
#[derive(Clone)]
pub struct Client {
    pool: Pool<Sqlite>,
    settings: PortalSettings,
}

impl Client {
    pub fn new(pool: Pool<Sqlite>, settings: PortalSettings) -> Self {
        Self { pool, settings }
    }

    pub fn fiscal_year(&self) -> i32 {
        self.settings.fiscal_year
    }

    pub fn usd_rate(&self) -> rust_decimal::Decimal {
        self.settings.usd_rate
    }

    /// Unfiltered portal payload with amounts in `currency`.
    pub async fn overview(&self, currency: Currency) -> Result<PortalOverview> {
        let q = PortalQuery { currency, ..PortalQuery::default() };
        Ok(transparency::overview(&self.pool, self.settings, &q).await?)
    }

    // newest first, every status
    pub async fn transactions(&self) -> Result<Vec<TransactionDetail>> {
        Ok(queries::list_transaction_details(&self.pool, TxnScope::All, None).await?)
    }
}
