use voyager_notifier::config::get_configuration;
use voyager_notifier::startup::{Application, StartupError};
use voyager_notifier::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let subscriber = get_subscriber(String::from("voyager_notifier"), String::from("info"));

    init_subscriber(subscriber);

    let config = get_configuration()?;
    let application = Application::build(config).await?;

    tracing::info!("Server listening on port {}", application.get_port());

    application.run_until_stop().await?;

    Ok(())
}
