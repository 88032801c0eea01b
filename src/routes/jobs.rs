use actix_web::{web, HttpResponse};

use crate::scheduler::Scheduler;

#[tracing::instrument(name = "Listing scheduled jobs", skip(scheduler))]
pub async fn handle_list_jobs(scheduler: web::Data<Scheduler>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "jobs": scheduler.jobs().await }))
}
