use sqlx::PgPool;

/// Executes the SQL query types declared in [`crate::entities`] through
/// their [`kanau::processor::Processor`] impls.
#[derive(Debug, Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}

impl DatabaseProcessor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
