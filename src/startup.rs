use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::net::TcpListener;
use std::sync::Arc;
use std::time;
use tokio_cron_scheduler::JobSchedulerError;
use tracing_actix_web::TracingLogger;

use crate::config::{DatabaseSettings, Settings};
use crate::email_client::{EmailError, EmailSender, SmtpEmailClient};
use crate::ephemeris_client::EphemerisClient;
use crate::notifier::ThresholdNotifier;
use crate::routes::{
    handle_delete_user, handle_get_user, handle_list_jobs, handle_list_users, handle_notify_user,
    handle_register, health_check,
};
use crate::scheduler::{JobFuture, Scheduler};
use crate::utils::error_chain_fmt;

pub const DISTANCE_CHECK_JOB_ID: &str = "voyager_check";
pub const DISTANCE_CHECK_JOB_NAME: &str = "check_and_notify";

pub struct Application {
    port: u16,
    server: Server,
    scheduler: Arc<Scheduler>,
}

#[derive(thiserror::Error)]
pub enum StartupError {
    #[error("Failed to load the configuration.")]
    Config(#[from] config::ConfigError),
    #[error("Sender email is not valid: {0}")]
    InvalidSender(String),
    #[error("Failed to configure the SMTP client.")]
    Email(#[from] EmailError),
    #[error("Failed to build the ephemeris HTTP client.")]
    HttpClient(#[from] reqwest::Error),
    #[error("Failed to start the job scheduler.")]
    Scheduler(#[from] JobSchedulerError),
    #[error("Failed to run database migrations.")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Failed to bind or run the HTTP server.")]
    Io(#[from] std::io::Error),
}

impl std::fmt::Debug for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, StartupError> {
        let sender_email = config
            .get_email_client_sender()
            .map_err(StartupError::InvalidSender)?;
        let email_client = SmtpEmailClient::new(
            &config.email_client.smtp_host,
            config.email_client.smtp_port,
            config.email_client.username.clone(),
            config.email_client.password.clone(),
            sender_email,
            Some(config.email_client.get_timeout()),
        )?;

        Self::build_with_email_client(config, Arc::new(email_client)).await
    }

    /// Same as `build`, delivering emails through the given sender instead of
    /// the configured SMTP server.
    pub async fn build_with_email_client(
        config: Settings,
        email_client: Arc<dyn EmailSender>,
    ) -> Result<Self, StartupError> {
        let db_pool = get_connection_db_pool(&config.database);

        sqlx::migrate!("./migrations").run(&db_pool).await?;

        let ephemeris_client = EphemerisClient::new(
            config.get_ephemeris_base_url(),
            config.ephemeris.command.clone(),
            config.ephemeris.center.clone(),
            Some(config.ephemeris.get_timeout()),
        )?;
        let notifier = Arc::new(ThresholdNotifier::new(
            db_pool.clone(),
            ephemeris_client,
            email_client,
            config.ephemeris.spacecraft_name.clone(),
        ));

        let scheduler = Arc::new(Scheduler::build().await?);
        schedule_distance_check(
            &scheduler,
            Arc::clone(&notifier),
            config.get_notifier_interval(),
        )
        .await?;

        let listener = TcpListener::bind(config.get_address())?;
        let port = listener.local_addr()?.port();
        let server = run(listener, db_pool, notifier, Arc::clone(&scheduler))?;

        Ok(Self {
            port,
            server,
            scheduler,
        })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        let result = self.server.await;

        if let Err(err) = self.scheduler.shutdown().await {
            tracing::error!("Failed to stop the scheduler: {:?}", err);
        }

        result
    }
}

pub async fn schedule_distance_check(
    scheduler: &Scheduler,
    notifier: Arc<ThresholdNotifier>,
    interval: time::Duration,
) -> Result<(), JobSchedulerError> {
    scheduler
        .add_interval_job(
            DISTANCE_CHECK_JOB_ID,
            DISTANCE_CHECK_JOB_NAME,
            interval,
            move || {
                let notifier = Arc::clone(&notifier);
                let job: JobFuture = Box::pin(async move {
                    if let Err(err) = notifier.check_and_notify().await {
                        tracing::error!("Scheduled notification pass failed: {:?}", err);
                    }
                });
                job
            },
        )
        .await
}

pub fn run(
    listener: TcpListener,
    db_pool: SqlitePool,
    notifier: Arc<ThresholdNotifier>,
    scheduler: Arc<Scheduler>,
) -> Result<Server, std::io::Error> {
    let db_pool = web::Data::new(db_pool);
    let notifier = web::Data::from(notifier);
    let scheduler = web::Data::from(scheduler);

    let server = HttpServer::new(move || {
        // App is where your application logic lives: routing, middlewares, request handler, etc
        App::new()
            // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
            // request logger
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/register", web::post().to(handle_register))
            .route("/users", web::get().to(handle_list_users))
            .route("/users/{id}", web::get().to(handle_get_user))
            .route("/users/{id}", web::delete().to(handle_delete_user))
            .route("/users/{id}/notify", web::post().to(handle_notify_user))
            .route("/jobs", web::get().to(handle_list_jobs))
            .app_data(db_pool.clone())
            .app_data(notifier.clone())
            .app_data(scheduler.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn get_connection_db_pool(config: &DatabaseSettings) -> SqlitePool {
    SqlitePoolOptions::new()
        .acquire_timeout(time::Duration::from_secs(2))
        .connect_lazy_with(config.get_db_options())
}
