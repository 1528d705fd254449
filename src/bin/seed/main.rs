//! Prepares a database: creates the schema, inserts the default reference
//! rows, and optionally creates a staff account.
//!
//! `seed [username email password]`

use anyhow::{bail, Context};
use bandtogether::accounts::{self, AccountError};
use env_logger::Env;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let db = bandtogether::db::connect(&database_url).await?;
    bandtogether::db::create_schema(&db).await?;
    let inserted = bandtogether::taxonomy::seed_defaults(&db).await?;
    println!("Inserted {} reference rows.", inserted);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => {}
        [username, email, password] => {
            let user = match accounts::create_user(&db, username, email, password).await {
                Ok(user) => user,
                Err(AccountError::Taken(field)) => bail!("That {} is already in use.", field),
                Err(err) => bail!("Unable to create the account: {}", err),
            };
            accounts::set_staff(&db, user.id, true).await?;
            println!("Created staff account {} ({}).", user.username, user.id);
        }
        _ => bail!("usage: seed [username email password]"),
    }

    Ok(())
}
