use sqlx::{sqlite::SqliteRow, Executor, Row, Sqlite, SqlitePool};

use crate::domain::{
    distance_unit::DistanceUnit, new_subscriber::NewSubscriber, subscriber::Subscriber,
    subscriber_email::SubscriberEmail,
};
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("Email already registered")]
    EmailAlreadyRegistered,
    #[error("Subscriber {id} holds invalid data: {reason}")]
    Corrupted { id: i64, reason: String },
    #[error("Failed to access the subscribers table.")]
    Database(#[from] sqlx::Error),
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[tracing::instrument(name = "Fetch all subscribers", skip(db_pool))]
pub async fn list_subscribers(db_pool: &SqlitePool) -> Result<Vec<Subscriber>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT id, email, unit, last_notified_distance
        FROM subscribers
        ORDER BY id
        "#,
    )
    .fetch_all(db_pool)
    .await?;

    rows.into_iter().map(parse_subscriber).collect()
}

#[tracing::instrument(name = "Fetch a subscriber by id", skip(db_pool))]
pub async fn get_subscriber(
    db_pool: &SqlitePool,
    subscriber_id: i64,
) -> Result<Option<Subscriber>, StoreError> {
    let row = sqlx::query(
        r#"
        SELECT id, email, unit, last_notified_distance
        FROM subscribers
        WHERE id = ?
        "#,
    )
    .bind(subscriber_id)
    .fetch_optional(db_pool)
    .await?;

    row.map(parse_subscriber).transpose()
}

#[tracing::instrument(name = "Check whether an email is registered", skip(db_pool))]
pub async fn is_email_registered(db_pool: &SqlitePool, email: &str) -> Result<bool, StoreError> {
    let existing = sqlx::query("SELECT id FROM subscribers WHERE email = ?")
        .bind(email)
        .fetch_optional(db_pool)
        .await?;

    Ok(existing.is_some())
}

#[tracing::instrument(
    name = "Insert a new subscriber into the database",
    skip(new_subscriber, db_pool),
    fields(
        subscriber_email = %new_subscriber.email,
        subscriber_unit = %new_subscriber.unit.as_ref()
    )
)]
pub async fn insert_subscriber(
    db_pool: &SqlitePool,
    new_subscriber: &NewSubscriber,
) -> Result<Subscriber, StoreError> {
    if is_email_registered(db_pool, new_subscriber.email.as_ref()).await? {
        return Err(StoreError::EmailAlreadyRegistered);
    }

    // The unique constraint still catches a registration racing with this one.
    let result = sqlx::query(
        r#"
        INSERT INTO subscribers (email, unit, last_notified_distance)
        VALUES (?, ?, 0.0)
        "#,
    )
    .bind(new_subscriber.email.as_ref())
    .bind(new_subscriber.unit.as_ref())
    .execute(db_pool)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            StoreError::EmailAlreadyRegistered
        } else {
            tracing::error!("Failed to execute query: {:?}", err);
            StoreError::Database(err)
        }
    })?;

    Ok(Subscriber {
        id: result.last_insert_rowid(),
        email: new_subscriber.email.clone(),
        unit: new_subscriber.unit,
        last_notified_distance: 0.0,
    })
}

/// Returns `false` when no subscriber had the given id.
#[tracing::instrument(name = "Delete a subscriber", skip(db_pool))]
pub async fn delete_subscriber(db_pool: &SqlitePool, subscriber_id: i64) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM subscribers WHERE id = ?")
        .bind(subscriber_id)
        .execute(db_pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Single-row update of the reference distance. Returns `false` when the
/// subscriber no longer exists, which callers treat as a no-op.
#[tracing::instrument(name = "Update subscriber reference distance", skip(executor))]
pub async fn update_reference_distance<'e, E>(
    executor: E,
    subscriber_id: i64,
    distance_km: f64,
) -> Result<bool, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE subscribers SET last_notified_distance = ? WHERE id = ?")
        .bind(distance_km)
        .bind(subscriber_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn parse_subscriber(row: SqliteRow) -> Result<Subscriber, StoreError> {
    let id: i64 = row.try_get("id")?;
    let email = SubscriberEmail::parse(row.try_get("email")?)
        .map_err(|reason| StoreError::Corrupted { id, reason })?;
    let unit = DistanceUnit::parse(row.try_get("unit")?)
        .map_err(|reason| StoreError::Corrupted { id, reason })?;

    Ok(Subscriber {
        id,
        email,
        unit,
        last_notified_distance: row.try_get("last_notified_distance")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.message().contains("UNIQUE constraint failed"),
        _ => false,
    }
}
