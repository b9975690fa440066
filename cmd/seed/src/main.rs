//! Creates the initial admin account in Postgres.
//!
//! Reads `SEED_ADMIN_NAME`, `SEED_ADMIN_EMAIL` and `SEED_ADMIN_PASSWORD`
//! (after `.env`), plus the regular `BLOG__*` configuration for the database.
//! Running it twice is harmless: an existing account is left untouched.

use std::sync::Arc;

use anyhow::Context;
use auth_adapters::{Argon2Hasher, JwtIssuer};
use configs::Settings;
use domains::AppError;
use secrecy::ExposeSecret;
use services::UserService;
use storage_adapters::{postgres, PgUserRepository};
use tracing_subscriber::EnvFilter;
use validator::Validate;

#[derive(Debug, Validate)]
struct AdminAccount {
    #[validate(length(min = 2, message = "SEED_ADMIN_NAME must be at least 2 characters"))]
    name: String,
    #[validate(email(message = "SEED_ADMIN_EMAIL is not a valid email"))]
    email: String,
    password: String,
}

fn required(var: &str) -> anyhow::Result<String> {
    std::env::var(var).with_context(|| format!("{var} must be set"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let admin = AdminAccount {
        name: required("SEED_ADMIN_NAME")?,
        email: required("SEED_ADMIN_EMAIL")?,
        password: required("SEED_ADMIN_PASSWORD")?,
    };
    admin.validate().context("invalid admin account")?;

    let pool = postgres::connect(
        settings.database.url.expose_secret(),
        settings.database.max_connections,
    )
    .await
    .context("connecting to postgres")?;

    let users = UserService::new(
        Arc::new(PgUserRepository::new(pool)),
        Arc::new(Argon2Hasher::new()),
        Arc::new(JwtIssuer::new(
            &settings.auth.jwt_secret,
            settings.auth.token_ttl_hours,
        )),
    );

    match users.signup(&admin.name, &admin.email, &admin.password).await {
        Ok(session) => {
            tracing::info!(user = %session.user.id, email = %session.user.email, "admin created");
            Ok(())
        }
        Err(AppError::Conflict(_)) => {
            tracing::info!(email = %admin.email, "admin already exists, nothing to do");
            Ok(())
        }
        Err(err) => Err(err).context("creating admin"),
    }
}
