pub mod distance_unit;
pub mod new_subscriber;
pub mod subscriber;
pub mod subscriber_email;
