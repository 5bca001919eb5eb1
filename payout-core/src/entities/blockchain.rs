use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Blockchain {
    pub key: String,
    pub name: String,
    /// Node client family, e.g. `geth` or `bitcoin`.
    pub client: String,
    pub server: Option<String>,
    pub height: i64,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct GetBlockchainByKey {
    pub key: String,
}

impl Processor<GetBlockchainByKey> for DatabaseProcessor {
    type Output = Option<Blockchain>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetBlockchainByKey")]
    async fn process(&self, query: GetBlockchainByKey) -> Result<Option<Blockchain>, sqlx::Error> {
        let blockchain = sqlx::query_as::<_, Blockchain>(
            r#"
            SELECT key, name, client, server, height, status
            FROM blockchains
            WHERE key = $1
            "#,
        )
        .bind(query.key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(blockchain)
    }
}

#[derive(Debug, Clone)]
/// Insert a blockchain. Returns `false` if the key already existed.
pub struct InsertBlockchain {
    pub blockchain: Blockchain,
}

impl Processor<InsertBlockchain> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertBlockchain")]
    async fn process(&self, cmd: InsertBlockchain) -> Result<bool, sqlx::Error> {
        let Blockchain {
            key,
            name,
            client,
            server,
            height,
            status,
        } = cmd.blockchain;
        let result = sqlx::query(
            r#"
            INSERT INTO blockchains (key, name, client, server, height, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(name)
        .bind(client)
        .bind(server)
        .bind(height)
        .bind(status)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
