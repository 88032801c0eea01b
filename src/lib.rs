pub mod config;
pub mod domain;
pub mod email_client;
pub mod email_template;
pub mod ephemeris_client;
pub mod notifier;
pub mod routes;
pub mod scheduler;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod utils;
