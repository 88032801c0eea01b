use async_trait::async_trait;
use reqwest::Response;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use voyager_notifier::{
    config::get_configuration,
    domain::subscriber_email::SubscriberEmail,
    email_client::{EmailError, EmailSender},
    email_template::EmailContent,
    ephemeris_client::EphemerisClient,
    notifier::ThresholdNotifier,
    startup::{get_connection_db_pool, Application},
};

pub struct TestApp {
    pub address: String,
    pub db_pool: SqlitePool,
    pub ephemeris_server: MockServer,
    pub email_client: Arc<RecordingEmailSender>,
    pub notifier: ThresholdNotifier,
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub content: EmailContent,
}

/// Stands in for the SMTP client: keeps every email it is asked to send and
/// fails for the recipients it was told to.
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<SentEmail>>,
    failing_recipients: Mutex<Vec<String>>,
}

impl RecordingEmailSender {
    pub fn sent_emails(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_for(&self, recipient: &str) {
        self.failing_recipients
            .lock()
            .unwrap()
            .push(recipient.to_string());
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        content: &EmailContent,
    ) -> Result<(), EmailError> {
        let recipient = recipient.as_ref().to_string();

        if self.failing_recipients.lock().unwrap().contains(&recipient) {
            let address_error = "not an address"
                .parse::<lettre::Address>()
                .unwrap_err();
            return Err(EmailError::InvalidAddress(recipient, address_error));
        }

        self.sent.lock().unwrap().push(SentEmail {
            recipient,
            content: content.clone(),
        });

        Ok(())
    }
}

impl TestApp {
    pub async fn spawn_app() -> TestApp {
        let mut config = get_configuration().expect("Missing configuration file.");
        let db_filename = std::env::temp_dir().join(format!("voyager_{}.db", Uuid::new_v4()));
        let ephemeris_server = MockServer::start().await;
        let email_client = Arc::new(RecordingEmailSender::default());

        // We are using port 0 as way to define a different port per each test. Port 0 is a special case that operating systems
        // take into account: when port is 0, the OS will search for the first available port
        config.set_app_port(0);
        config.set_ephemeris_base_url(ephemeris_server.uri());
        config.set_db_filename(db_filename.to_string_lossy().into_owned());

        let application =
            Application::build_with_email_client(config.clone(), email_client.clone())
                .await
                .expect("Failed to build application.");

        let address = format!("http://127.0.0.1:{}", application.get_port());

        tokio::spawn(application.run_until_stop());

        let db_pool = get_connection_db_pool(&config.database);
        let ephemeris_client = EphemerisClient::new(
            ephemeris_server.uri(),
            config.ephemeris.command.clone(),
            config.ephemeris.center.clone(),
            None,
        )
        .expect("Failed to build ephemeris client.");
        let notifier = ThresholdNotifier::new(
            db_pool.clone(),
            ephemeris_client,
            email_client.clone(),
            config.ephemeris.spacecraft_name.clone(),
        );

        TestApp {
            address,
            db_pool,
            ephemeris_server,
            email_client,
            notifier,
        }
    }

    pub async fn post_register(&self, body: HashMap<&str, &str>) -> Response {
        reqwest::Client::new()
            .post(format!("{}/register", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_users(&self) -> Response {
        reqwest::Client::new()
            .get(format!("{}/users", self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_user(&self, id: i64) -> Response {
        reqwest::Client::new()
            .get(format!("{}/users/{}", self.address, id))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn delete_user(&self, id: i64) -> Response {
        reqwest::Client::new()
            .delete(format!("{}/users/{}", self.address, id))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn notify_user(&self, id: i64) -> Response {
        reqwest::Client::new()
            .post(format!("{}/users/{}/notify", self.address, id))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_jobs(&self) -> Response {
        reqwest::Client::new()
            .get(format!("{}/jobs", self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Registers a subscriber through the API and returns its id.
    pub async fn register(&self, email: &str, unit: &str) -> i64 {
        let body = HashMap::from([("email", email), ("unit", unit)]);
        let response = self.post_register(body).await;

        assert_eq!(response.status().as_u16(), 200);

        self.subscriber_id(email)
            .await
            .expect("Registered subscriber not found.")
    }

    pub async fn subscriber_id(&self, email: &str) -> Option<i64> {
        sqlx::query("SELECT id FROM subscribers WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.db_pool)
            .await
            .expect("Failed to query subscribers.")
            .map(|row| row.get("id"))
    }

    pub async fn count_subscribers(&self, email: &str) -> i64 {
        sqlx::query("SELECT COUNT(*) AS total FROM subscribers WHERE email = ?")
            .bind(email)
            .fetch_one(&self.db_pool)
            .await
            .expect("Failed to count subscribers.")
            .get("total")
    }

    pub async fn reference_distance(&self, id: i64) -> f64 {
        sqlx::query("SELECT last_notified_distance FROM subscribers WHERE id = ?")
            .bind(id)
            .fetch_one(&self.db_pool)
            .await
            .expect("Failed to fetch reference distance.")
            .get("last_notified_distance")
    }

    pub async fn set_reference_distance(&self, id: i64, distance_km: f64) {
        sqlx::query("UPDATE subscribers SET last_notified_distance = ? WHERE id = ?")
            .bind(distance_km)
            .bind(id)
            .execute(&self.db_pool)
            .await
            .expect("Failed to set reference distance.");
    }

    /// Makes the ephemeris service answer with a vector of the given length.
    pub async fn mount_distance(&self, distance_km: f64) {
        Mock::given(method("GET"))
            .and(path("/api/horizons.api"))
            .respond_with(ResponseTemplate::new(200).set_body_string(horizons_body(distance_km)))
            .mount(&self.ephemeris_server)
            .await;
    }

    pub async fn mount_ephemeris_failure(&self) {
        Mock::given(method("GET"))
            .and(path("/api/horizons.api"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&self.ephemeris_server)
            .await;
    }
}

pub fn horizons_body(distance_km: f64) -> String {
    format!(
        r#"$$SOE
2461329.833333333 = A.D. 2026-Oct-16 08:00:00.0000 TDB
 X = {:.16E} Y = 0.0E0 Z = 0.0E0
$$EOE
"#,
        distance_km
    )
}
