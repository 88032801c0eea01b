use actix_web::{web, HttpResponse};
use sqlx::SqlitePool;

use crate::domain::subscriber::Subscriber;
use crate::notifier::ThresholdNotifier;
use crate::routes::ApiError;
use crate::store;

#[tracing::instrument(name = "Listing subscribers", skip(db_pool))]
pub async fn handle_list_users(db_pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let subscribers = store::list_subscribers(db_pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "users": subscribers })))
}

#[tracing::instrument(name = "Fetching a subscriber", skip(db_pool))]
pub async fn handle_get_user(
    path: web::Path<i64>,
    db_pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let subscriber = find_subscriber(db_pool.get_ref(), path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "user": subscriber })))
}

#[tracing::instrument(name = "Deleting a subscriber", skip(db_pool))]
pub async fn handle_delete_user(
    path: web::Path<i64>,
    db_pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    if !store::delete_subscriber(db_pool.get_ref(), path.into_inner()).await? {
        return Err(ApiError::UserNotFound);
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "User deleted" })))
}

#[tracing::instrument(name = "Notifying a subscriber on demand", skip(db_pool, notifier))]
pub async fn handle_notify_user(
    path: web::Path<i64>,
    db_pool: web::Data<SqlitePool>,
    notifier: web::Data<ThresholdNotifier>,
) -> Result<HttpResponse, ApiError> {
    let subscriber = find_subscriber(db_pool.get_ref(), path.into_inner()).await?;
    let current_distance = notifier
        .current_distance()
        .await
        .ok_or(ApiError::DistanceUnavailable)?;

    if !notifier
        .notify_subscriber(&subscriber, current_distance)
        .await?
    {
        tracing::warn!(
            subscriber_id = subscriber.id,
            "Subscriber deleted while being notified"
        );
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "User notified" })))
}

async fn find_subscriber(db_pool: &SqlitePool, subscriber_id: i64) -> Result<Subscriber, ApiError> {
    store::get_subscriber(db_pool, subscriber_id)
        .await?
        .ok_or(ApiError::UserNotFound)
}
