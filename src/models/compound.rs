//! Compound reference table: the resolver used when a composition names a CID.

use crate::error::AppError;
use crate::sync::Compound;
use sqlx::PgConnection;

/// Create-if-missing by CID, then return the row. Safe against concurrent creation of the same CID.
pub async fn ensure(conn: &mut PgConnection, cid: i64) -> Result<Compound, AppError> {
    tracing::debug!(cid, "ensure compound");
    sqlx::query("INSERT INTO compounds (cid) VALUES ($1) ON CONFLICT (cid) DO NOTHING")
        .bind(cid)
        .execute(&mut *conn)
        .await?;
    let (cid, name, formula) = sqlx::query_as::<_, (i64, Option<String>, Option<String>)>(
        "SELECT cid, name, formula FROM compounds WHERE cid = $1",
    )
    .bind(cid)
    .fetch_one(&mut *conn)
    .await?;
    Ok(Compound { cid, name, formula })
}
