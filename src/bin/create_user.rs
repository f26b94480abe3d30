use std::io::{self, Write};

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use accounts_api::auth::passwords::PasswordService;

/// Provision an account directly against the database.
///
/// The HTTP surface only ever creates `user` accounts; this tool is how an
/// `admin` account comes to exist.
#[derive(Parser, Debug)]
#[command(name = "create_user", about = "Create an account")]
struct Args {
    /// Email address for the account (stored lower-cased).
    #[arg(long)]
    email: String,

    /// Plaintext password to hash and store.
    #[arg(long)]
    password: String,

    /// Display name for the account.
    #[arg(long)]
    full_name: String,

    /// Role to assign (`user` or `admin`).
    #[arg(long, default_value = "user")]
    role: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    let email = args.email.trim().to_lowercase();

    if !email.contains('@') {
        writeln!(io::stderr(), "error: email must contain '@'")?;
        std::process::exit(1);
    }

    if args.password.len() < 8 {
        writeln!(io::stderr(), "error: password must be at least 8 characters")?;
        std::process::exit(1);
    }

    let role = match args.role.trim().to_lowercase().as_str() {
        "admin" => "admin",
        "user" => "user",
        other => {
            writeln!(
                io::stderr(),
                "error: unsupported role '{other}'. Use 'user' or 'admin'."
            )?;
            std::process::exit(1);
        }
    };

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    let existing =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE lower(email) = $1")
            .bind(&email)
            .fetch_one(&pool)
            .await?;

    if existing > 0 {
        writeln!(
            io::stderr(),
            "error: a user with email '{email}' already exists."
        )?;
        std::process::exit(1);
    }

    let password_service = PasswordService::new()
        .map_err(|err| io::Error::other(format!("argon2 init failed: {err}")))?;
    let password_hash = password_service
        .hash_password(&args.password)
        .map_err(|err| io::Error::other(format!("password hash failed: {err}")))?;

    let user_id: i32 = sqlx::query_scalar(
        "INSERT INTO users (full_name, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(args.full_name.trim())
    .bind(&email)
    .bind(&password_hash)
    .bind(role)
    .fetch_one(&pool)
    .await?;

    println!("Created {role} account '{email}' with id {user_id}");
    Ok(())
}
