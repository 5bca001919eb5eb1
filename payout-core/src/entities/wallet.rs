use crate::entities::{WalletKind, WalletStatus};
use crate::framework::DatabaseProcessor;
use crate::gateway::WalletSettings;
use kanau::processor::Processor;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Wallet {
    pub id: i64,
    pub blockchain_key: String,
    pub name: String,
    pub address: String,
    pub kind: WalletKind,
    /// Adapter kind handling this wallet, e.g. `opendax_cloud`.
    pub gateway: String,
    /// Adapter-specific settings (`uri`, `secret`, ...).
    pub settings: serde_json::Value,
    pub status: WalletStatus,
}

impl Wallet {
    /// Settings handed to the gateway adapter.
    pub fn gateway_settings(&self) -> WalletSettings {
        let field = |key: &str| {
            self.settings
                .get(key)
                .and_then(serde_json::Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };
        WalletSettings {
            uri: field("uri"),
            address: Some(self.address.clone()).filter(|a| !a.is_empty()),
            secret: field("secret"),
        }
    }
}

/// Data for inserting a new wallet together with its currency links.
#[derive(Debug, Clone)]
pub struct WalletInsert {
    pub blockchain_key: String,
    pub name: String,
    pub address: String,
    pub kind: WalletKind,
    pub gateway: String,
    pub settings: serde_json::Value,
    pub status: WalletStatus,
    pub currencies: Vec<String>,
}

#[derive(Debug, Clone)]
/// Get active hot wallets serving a currency, lowest id first.
pub struct GetActiveHotWalletsForCurrency {
    pub currency_id: String,
}

impl Processor<GetActiveHotWalletsForCurrency> for DatabaseProcessor {
    type Output = Vec<Wallet>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetActiveHotWalletsForCurrency")]
    async fn process(
        &self,
        query: GetActiveHotWalletsForCurrency,
    ) -> Result<Vec<Wallet>, sqlx::Error> {
        let wallets = sqlx::query_as::<_, Wallet>(
            r#"
            SELECT w.id, w.blockchain_key, w.name, w.address, w.kind, w.gateway, w.settings, w.status
            FROM wallets w
            JOIN currencies_wallets cw ON cw.wallet_id = w.id
            WHERE cw.currency_id = $1
              AND w.status = 'active'
              AND w.kind = 'hot'
            ORDER BY w.id ASC
            "#,
        )
        .bind(query.currency_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(wallets)
    }
}

#[derive(Debug, Clone)]
/// Look a wallet up by its import key.
pub struct GetWalletByBlockchainKind {
    pub blockchain_key: String,
    pub kind: WalletKind,
}

impl Processor<GetWalletByBlockchainKind> for DatabaseProcessor {
    type Output = Option<Wallet>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetWalletByBlockchainKind")]
    async fn process(&self, query: GetWalletByBlockchainKind) -> Result<Option<Wallet>, sqlx::Error> {
        let wallet = sqlx::query_as::<_, Wallet>(
            r#"
            SELECT id, blockchain_key, name, address, kind, gateway, settings, status
            FROM wallets
            WHERE blockchain_key = $1 AND kind = $2
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(query.blockchain_key)
        .bind(query.kind)
        .fetch_optional(&self.pool)
        .await?;
        Ok(wallet)
    }
}

#[derive(Debug, Clone)]
/// Insert a wallet and link it to its currencies in one transaction.
///
/// Returns the new wallet id.
pub struct InsertWallet {
    pub wallet: WalletInsert,
}

impl Processor<InsertWallet> for DatabaseProcessor {
    type Output = i64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertWallet")]
    async fn process(&self, cmd: InsertWallet) -> Result<i64, sqlx::Error> {
        let WalletInsert {
            blockchain_key,
            name,
            address,
            kind,
            gateway,
            settings,
            status,
            currencies,
        } = cmd.wallet;

        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO wallets (blockchain_key, name, address, kind, gateway, settings, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(blockchain_key)
        .bind(name)
        .bind(address)
        .bind(kind)
        .bind(gateway)
        .bind(settings)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        if !currencies.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO currencies_wallets (currency_id, wallet_id)
                SELECT UNNEST($1::varchar[]), $2
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(&currencies)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(id)
    }
}
