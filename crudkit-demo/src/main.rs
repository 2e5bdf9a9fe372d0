use std::process::ExitCode;

use crudkit_core::config::{validate_section, CrudkitConfig};
use crudkit_data_sqlx::{ConnectionManager, DatabaseConfig};
use crudkit_demo::{run_demo, tables};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    crudkit_core::init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Demo failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), BoxError> {
    let raw = CrudkitConfig::load("dev")?;
    validate_section::<DatabaseConfig>(&raw)?;
    let config = raw.with_typed::<DatabaseConfig>()?;

    let manager = ConnectionManager::configure(&config)?;
    manager.init_schema(&tables()).await?;

    let result = run_demo(&manager).await;
    manager.close().await;
    let outcome = result?;

    println!("{}", outcome.fetched);
    for record in &outcome.all {
        println!("{record}");
    }
    Ok(())
}
