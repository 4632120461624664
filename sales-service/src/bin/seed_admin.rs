use anyhow::{anyhow, Context, Result};
use clap::Parser;
use common_auth::Role;
use sales_service::passwords::PasswordService;
use sales_service::users::{self, NewUser};
use sales_service::MIGRATOR;
use sqlx::PgPool;

#[derive(Parser, Debug)]
#[command(about = "Create the initial admin account if it does not exist yet", long_about = None)]
struct Options {
    #[arg(long, env = "SEED_ADMIN_NAME", default_value = "Admin")]
    name: String,

    #[arg(long, env = "SEED_ADMIN_EMAIL", default_value = "admin@example.com")]
    email: String,

    /// Change this after the first login
    #[arg(long, env = "SEED_ADMIN_PASSWORD", default_value = "Admin123!", hide_env_values = true)]
    password: String,

    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Must match the running service or the seeded password will never verify
    #[arg(long, env = "PASSWORD_PEPPER", hide_env_values = true)]
    password_pepper: Option<String>,

    /// Apply pending migrations before seeding
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let opts = Options::parse();
    if opts.password.trim().is_empty() {
        return Err(anyhow!("--password must not be empty"));
    }

    let pool = PgPool::connect(&opts.database_url)
        .await
        .context("failed to connect to DATABASE_URL")?;
    if opts.migrate {
        MIGRATOR.run(&pool).await.context("failed to run migrations")?;
    }

    if users::email_exists(&pool, &opts.email).await? {
        println!("admin {}: already present, skipping", opts.email);
        return Ok(());
    }

    let passwords = PasswordService::new(opts.password_pepper.as_deref());
    let password_hash = passwords
        .hash_blocking(opts.password)
        .await
        .map_err(|err| anyhow!("failed to hash admin password: {err}"))?;

    let user = users::insert(
        &pool,
        NewUser {
            name: &opts.name,
            email: &opts.email,
            password_hash: &password_hash,
            role: Role::Admin,
        },
    )
    .await?;

    println!("admin {}: created with id {}", user.email, user.id);
    Ok(())
}
