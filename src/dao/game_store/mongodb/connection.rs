//! Initial connection handshake with retry.

use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::{debug, warn};

use super::error::{MongoDaoError, MongoResult};

/// How many pings to attempt before declaring the database unreachable.
const MAX_PING_ATTEMPTS: u32 = 10;
/// Delay before the first retry. Doubles after each failure.
const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(250);
/// Upper bound on the backoff delay.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Builds a client from the parsed options and pings the target database
/// until it answers, backing off between attempts.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    let mut attempts = 0;
    let mut delay = INITIAL_RETRY_DELAY;

    loop {
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => {
                debug!(database = database_name, "MongoDB answered ping");
                break;
            }
            Err(err) => {
                attempts += 1;
                if attempts >= MAX_PING_ATTEMPTS {
                    return Err(MongoDaoError::InitialPing {
                        attempts,
                        source: err,
                    });
                }
                warn!(
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    "MongoDB ping failed, retrying"
                );
                sleep(delay).await;
                delay = (delay * 2).min(MAX_RETRY_DELAY);
            }
        }
    }

    Ok((client, database))
}
