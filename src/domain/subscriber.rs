use crate::domain::distance_unit::DistanceUnit;
use crate::domain::subscriber_email::SubscriberEmail;

#[derive(Debug, Clone, serde::Serialize)]
pub struct Subscriber {
    pub id: i64,
    pub email: SubscriberEmail,
    pub unit: DistanceUnit,
    /// Distance in kilometers at the last notification, 0.0 if never notified.
    pub last_notified_distance: f64,
}
