use actix_web::web;
use serde::Deserialize;

use crate::domain::distance_unit::DistanceUnit;
use crate::domain::subscriber_email::SubscriberEmail;

#[derive(Debug)]
pub struct NewSubscriber {
    pub email: SubscriberEmail,
    pub unit: DistanceUnit,
}

#[derive(Deserialize)]
pub struct NewSubscriberBody {
    pub email: String,
    pub unit: String,
}

#[derive(Debug, PartialEq)]
pub enum NewSubscriberError {
    InvalidEmail(String),
    InvalidUnit(String),
}

impl TryFrom<web::Json<NewSubscriberBody>> for NewSubscriber {
    type Error = NewSubscriberError;

    fn try_from(body: web::Json<NewSubscriberBody>) -> Result<Self, Self::Error> {
        let email =
            SubscriberEmail::parse(body.email.clone()).map_err(NewSubscriberError::InvalidEmail)?;
        let unit = DistanceUnit::parse(body.unit.clone()).map_err(NewSubscriberError::InvalidUnit)?;

        Ok(NewSubscriber { email, unit })
    }
}
