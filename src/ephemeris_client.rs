use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::Client;
use std::sync::LazyLock;
use std::time;

use crate::utils::error_chain_fmt;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(30);
const HORIZONS_PATH: &str = "/api/horizons.api";
const HORIZONS_TIME_FORMAT: &str = "%Y-%b-%d %H:%M";

static POSITION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"X =\s*(-?\d+\.\d+E[+-]?\d+)\s+Y =\s*(-?\d+\.\d+E[+-]?\d+)\s+Z =\s*(-?\d+\.\d+E[+-]?\d+)",
    )
    .unwrap()
});

/// Client for the JPL Horizons ephemeris service, reduced to a single
/// question: how far is the target body from the center body right now.
pub struct EphemerisClient {
    http_client: Client,
    base_url: String,
    command: String,
    center: String,
}

#[derive(thiserror::Error)]
pub enum FetchDistanceError {
    #[error("Failed to query the ephemeris service.")]
    Request(#[from] reqwest::Error),
    #[error("Position vector not found in the ephemeris response.")]
    CoordinatesNotFound,
    #[error("Position vector component is not a number.")]
    InvalidCoordinate(#[from] std::num::ParseFloatError),
}

impl std::fmt::Debug for FetchDistanceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl EphemerisClient {
    pub fn new(
        base_url: String,
        command: String,
        center: String,
        timeout: Option<time::Duration>,
    ) -> Result<EphemerisClient, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()?;

        Ok(EphemerisClient {
            http_client,
            base_url,
            command,
            center,
        })
    }

    /// Distance in kilometers, or `None` when the service could not provide
    /// one. Failures are logged here; callers only decide whether to skip.
    pub async fn current_distance(&self) -> Option<f64> {
        match self.fetch_distance(Utc::now()).await {
            Ok(distance_km) => {
                tracing::info!(distance_km, "Fetched current distance");
                Some(distance_km)
            }
            Err(err) => {
                tracing::error!("Failed to fetch current distance: {:?}", err);
                None
            }
        }
    }

    #[tracing::instrument(name = "Query the ephemeris service", skip(self))]
    pub async fn fetch_distance(&self, now: DateTime<Utc>) -> Result<f64, FetchDistanceError> {
        let url = format!("{}{}", self.base_url, HORIZONS_PATH);
        let start_time = format_horizons_time(now);
        let stop_time = format_horizons_time(now + chrono::Duration::days(1));

        let body = self
            .http_client
            .get(&url)
            .query(&[
                ("format", String::from("text")),
                ("COMMAND", quoted(&self.command)),
                ("EPHEM_TYPE", String::from("VECTORS")),
                ("CENTER", quoted(&self.center)),
                ("START_TIME", quoted(&start_time)),
                ("STOP_TIME", quoted(&stop_time)),
                ("STEP_SIZE", quoted("1 d")),
                ("OUT_UNITS", String::from("KM")),
                ("REF_PLANE", String::from("ECLIPTIC")),
                ("VEC_TABLE", String::from("3")),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_distance(&body)
    }
}

/// Euclidean norm of the first `X = .. Y = .. Z = ..` vector in a Horizons
/// text response.
pub fn parse_distance(body: &str) -> Result<f64, FetchDistanceError> {
    let captures = POSITION_REGEX
        .captures(body)
        .ok_or(FetchDistanceError::CoordinatesNotFound)?;

    let mut sum_of_squares = 0.0;
    for index in 1..=3 {
        let component: f64 = captures[index].parse()?;
        sum_of_squares += component * component;
    }

    Ok(sum_of_squares.sqrt())
}

fn format_horizons_time(time: DateTime<Utc>) -> String {
    time.format(HORIZONS_TIME_FORMAT).to_string().to_uppercase()
}

fn quoted(value: &str) -> String {
    format!("'{}'", value)
}
