use sqlx::SqlitePool;
use std::sync::Arc;

use crate::domain::subscriber::Subscriber;
use crate::email_client::{EmailError, EmailSender};
use crate::email_template::DistanceReport;
use crate::ephemeris_client::EphemerisClient;
use crate::store::{self, StoreError};
use crate::utils::error_chain_fmt;

/// True once the spacecraft moved at least one of the subscriber's units
/// away from the distance they were last notified at.
/// `current - reference` would cancel low bits for large references, so the
/// comparison is made against `reference + unit`.
pub fn crossed_threshold(subscriber: &Subscriber, current_distance: f64) -> bool {
    current_distance >= subscriber.last_notified_distance + subscriber.unit.kilometers()
}

pub fn due_for_notification(
    subscribers: &[Subscriber],
    current_distance: f64,
) -> impl Iterator<Item = &Subscriber> {
    subscribers
        .iter()
        .filter(move |subscriber| crossed_threshold(subscriber, current_distance))
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub checked: usize,
    pub notified: usize,
    pub failed: usize,
    /// Notified subscribers that were deleted before their reference
    /// distance could be stored.
    pub vanished: usize,
}

#[derive(thiserror::Error)]
pub enum NotifierError {
    #[error("Failed to read or update subscribers.")]
    Store(#[from] StoreError),
    #[error("Failed to send a distance update.")]
    SendEmail(#[from] EmailError),
}

impl std::fmt::Debug for NotifierError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<sqlx::Error> for NotifierError {
    fn from(err: sqlx::Error) -> Self {
        NotifierError::Store(StoreError::Database(err))
    }
}

pub struct ThresholdNotifier {
    db_pool: SqlitePool,
    ephemeris_client: EphemerisClient,
    email_client: Arc<dyn EmailSender>,
    spacecraft: String,
}

impl ThresholdNotifier {
    pub fn new(
        db_pool: SqlitePool,
        ephemeris_client: EphemerisClient,
        email_client: Arc<dyn EmailSender>,
        spacecraft: String,
    ) -> ThresholdNotifier {
        ThresholdNotifier {
            db_pool,
            ephemeris_client,
            email_client,
            spacecraft,
        }
    }

    pub async fn current_distance(&self) -> Option<f64> {
        self.ephemeris_client.current_distance().await
    }

    /// Scheduled entry point. Returns `None` when no distance was available
    /// and the pass was skipped.
    #[tracing::instrument(name = "Check distance and notify subscribers", skip(self))]
    pub async fn check_and_notify(&self) -> Result<Option<PassReport>, NotifierError> {
        let Some(current_distance) = self.current_distance().await else {
            tracing::warn!("Distance unavailable, skipping notification pass");
            return Ok(None);
        };

        self.run_pass(current_distance).await.map(Some)
    }

    /// One pass over every subscriber at the given distance. A failed send is
    /// logged and does not stop the pass; only delivered notifications move
    /// the subscriber's reference distance, all committed together.
    #[tracing::instrument(name = "Run notification pass", skip(self))]
    pub async fn run_pass(&self, current_distance: f64) -> Result<PassReport, NotifierError> {
        let subscribers = store::list_subscribers(&self.db_pool).await?;
        let mut report = PassReport {
            checked: subscribers.len(),
            ..PassReport::default()
        };
        let mut notified_ids = Vec::new();

        for subscriber in due_for_notification(&subscribers, current_distance) {
            match self.send_distance_update(subscriber, current_distance).await {
                Ok(()) => {
                    report.notified += 1;
                    notified_ids.push(subscriber.id);
                }
                Err(err) => {
                    report.failed += 1;
                    tracing::error!(
                        subscriber_id = subscriber.id,
                        "Failed to notify subscriber: {:?}",
                        err
                    );
                }
            }
        }

        let mut transaction = self.db_pool.begin().await?;
        for subscriber_id in notified_ids {
            let updated =
                store::update_reference_distance(&mut transaction, subscriber_id, current_distance)
                    .await?;
            if !updated {
                report.vanished += 1;
                tracing::debug!(subscriber_id, "Subscriber deleted during the pass");
            }
        }
        transaction.commit().await?;

        tracing::info!(
            checked = report.checked,
            notified = report.notified,
            failed = report.failed,
            vanished = report.vanished,
            "Notification pass finished"
        );

        Ok(report)
    }

    /// Sends the update regardless of the threshold and resets the
    /// subscriber's reference distance. Returns `false` if the subscriber was
    /// deleted in the meantime.
    #[tracing::instrument(
        name = "Notify a single subscriber",
        skip(self, subscriber),
        fields(subscriber_id = subscriber.id)
    )]
    pub async fn notify_subscriber(
        &self,
        subscriber: &Subscriber,
        current_distance: f64,
    ) -> Result<bool, NotifierError> {
        self.send_distance_update(subscriber, current_distance).await?;

        let updated =
            store::update_reference_distance(&self.db_pool, subscriber.id, current_distance)
                .await?;

        Ok(updated)
    }

    async fn send_distance_update(
        &self,
        subscriber: &Subscriber,
        current_distance: f64,
    ) -> Result<(), EmailError> {
        let content = DistanceReport {
            spacecraft: &self.spacecraft,
            unit: subscriber.unit,
            distance_km: current_distance,
        }
        .render();

        self.email_client
            .send_email(&subscriber.email, &content)
            .await
    }
}
