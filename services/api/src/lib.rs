mod cli;
mod infra;
mod routes;
mod server;

use followup_health::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
