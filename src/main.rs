use std::process::ExitCode;

use fincache::app::{bootstrap, SessionStatus, StoreStatus};
use fincache::remote;
use fincache::storage::{self, CollectionKind};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fincache=info")),
        )
        .init();

    // Missing backend configuration is a hard startup failure
    let client = match remote::init_client() {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Cannot start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let report = bootstrap(storage::store(), client).await;

    match &report.store {
        StoreStatus::Ready(summary) => {
            for kind in CollectionKind::ALL {
                let state = if summary.is_populated(kind) {
                    "cached"
                } else {
                    "empty"
                };
                println!("{:<16} {}", kind.name(), state);
            }
        }
        StoreStatus::Failed(reason) => println!("local store unavailable: {}", reason),
    }

    match &report.session {
        SessionStatus::SignedIn(user) => println!(
            "signed in as {}",
            user.email.as_deref().unwrap_or(user.id.as_str())
        ),
        SessionStatus::SignedOut => println!("signed out"),
        SessionStatus::Failed(reason) => println!("session unavailable: {}", reason),
    }

    ExitCode::SUCCESS
}
