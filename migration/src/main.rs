//! Schema migration CLI for the labeling database.

use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    // DATABASE_URL usually lives in the service's .env file
    dotenvy::dotenv().ok();
    cli::run_cli(migration::Migrator).await;
}
