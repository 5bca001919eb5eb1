use crate::framework::DatabaseProcessor;
use crate::gateway::CurrencySettings;
use kanau::processor::Processor;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Currency {
    /// Currency code, e.g. `btc`.
    pub id: String,
    pub blockchain_key: String,
    /// Number of subunits in one unit.
    pub base_factor: i64,
    pub options: serde_json::Value,
    pub status: String,
}

impl Currency {
    /// Settings handed to the gateway adapter.
    pub fn gateway_settings(&self) -> CurrencySettings {
        CurrencySettings {
            id: self.id.clone(),
            base_factor: self.base_factor,
            options: self.options.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GetCurrencyById {
    pub id: String,
}

impl Processor<GetCurrencyById> for DatabaseProcessor {
    type Output = Option<Currency>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetCurrencyById")]
    async fn process(&self, query: GetCurrencyById) -> Result<Option<Currency>, sqlx::Error> {
        let currency = sqlx::query_as::<_, Currency>(
            r#"
            SELECT id, blockchain_key, base_factor, options, status
            FROM currencies
            WHERE id = $1
            "#,
        )
        .bind(query.id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(currency)
    }
}

#[derive(Debug, Clone)]
/// Insert a currency. Returns `false` if the code already existed.
pub struct InsertCurrency {
    pub currency: Currency,
}

impl Processor<InsertCurrency> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertCurrency")]
    async fn process(&self, cmd: InsertCurrency) -> Result<bool, sqlx::Error> {
        let Currency {
            id,
            blockchain_key,
            base_factor,
            options,
            status,
        } = cmd.currency;
        let result = sqlx::query(
            r#"
            INSERT INTO currencies (id, blockchain_key, base_factor, options, status)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(blockchain_key)
        .bind(base_factor)
        .bind(options)
        .bind(status)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
