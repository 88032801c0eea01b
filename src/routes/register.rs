use actix_web::{web, HttpResponse};
use sqlx::SqlitePool;

use crate::domain::new_subscriber::{NewSubscriber, NewSubscriberBody};
use crate::routes::ApiError;
use crate::store;

#[tracing::instrument(
    name = "Registering a new subscriber",
    skip(body, db_pool),
    fields(
        subscriber_email = %body.email,
        subscriber_unit = %body.unit
    )
)]
pub async fn handle_register(
    body: web::Json<NewSubscriberBody>,
    db_pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    // A known email is reported as such whatever the rest of the body holds
    if store::is_email_registered(db_pool.get_ref(), body.email.trim()).await? {
        return Err(ApiError::EmailAlreadyRegistered);
    }

    let new_subscriber: NewSubscriber = body.try_into()?;
    let subscriber = store::insert_subscriber(db_pool.get_ref(), &new_subscriber).await?;

    tracing::info!(subscriber_id = subscriber.id, "New subscriber registered");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "User registered",
        "user": {
            "email": subscriber.email,
            "unit": subscriber.unit,
        }
    })))
}
