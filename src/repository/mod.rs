pub mod contract_repo;
pub mod payment_repo;
pub mod project_repo;
pub mod quote_repo;
pub mod repository_error;

use mongodb::{
    options::{ClientOptions, Credential},
    Client, Database,
};

use crate::config::mongo_conf::MongoConfig;

/// Build a database handle from the shared Mongo configuration. Each
/// repository opens its own collection off this handle.
pub(crate) async fn connect(config: &MongoConfig) -> Result<Database, mongodb::error::Error> {
    let mut client_options = ClientOptions::parse(&config.uri).await?;
    client_options.app_name = Some("CrestlineBackend".to_string());
    client_options.max_pool_size = Some(config.pool_size);
    client_options.connect_timeout = Some(std::time::Duration::from_secs(
        config.connection_timeout_secs,
    ));

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        client_options.credential = Some(
            Credential::builder()
                .username(username.clone())
                .password(password.clone())
                .build(),
        );
    }

    let client = Client::with_options(client_options)?;
    Ok(client.database(&config.database))
}
