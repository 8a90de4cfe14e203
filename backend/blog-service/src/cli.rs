//! Command-line interface handling
//!
//! `blog-service healthcheck` probes the running server (container
//! healthchecks); `blog-service create-staff <username> <email> <password>`
//! creates an admin account. Anything else starts the server.

use std::io;

use crate::config::Config;
use crate::db;
use crate::services::AccountService;

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Healthcheck,
    CreateStaff {
        username: String,
        email: String,
        password: String,
    },
}

/// Parse arguments after the binary name; `Ok(None)` means start the server
pub fn parse_command<I>(mut args: I) -> Result<Option<Command>, String>
where
    I: Iterator<Item = String>,
{
    match args.next().as_deref() {
        Some("healthcheck") | Some("healthcheck-http") => Ok(Some(Command::Healthcheck)),
        Some("create-staff") => match (args.next(), args.next(), args.next()) {
            (Some(username), Some(email), Some(password)) => Ok(Some(Command::CreateStaff {
                username,
                email,
                password,
            })),
            _ => Err("usage: blog-service create-staff <username> <email> <password>".to_string()),
        },
        _ => Ok(None),
    }
}

/// Handle CLI commands.
///
/// Returns true if a command was processed (program should exit).
pub async fn handle_cli_commands(config: &Config) -> io::Result<bool> {
    let mut args = std::env::args();
    let _bin = args.next();

    let command = parse_command(args).map_err(|usage| {
        eprintln!("{}", usage);
        io::Error::new(io::ErrorKind::InvalidInput, usage)
    })?;

    match command {
        Some(Command::Healthcheck) => handle_healthcheck(config).await.map(|_| true),
        Some(Command::CreateStaff {
            username,
            email,
            password,
        }) => handle_create_staff(config, &username, &email, &password)
            .await
            .map(|_| true),
        None => Ok(false),
    }
}

async fn handle_healthcheck(config: &Config) -> io::Result<()> {
    let url = format!("http://127.0.0.1:{}/health", config.app.port);

    match reqwest::Client::new().get(&url).send().await {
        Ok(resp) if resp.status().is_success() => {
            tracing::info!("Healthcheck passed");
            Ok(())
        }
        Ok(resp) => {
            eprintln!("healthcheck failed: HTTP {}", resp.status());
            Err(io::Error::new(
                io::ErrorKind::Other,
                format!("healthcheck failed: HTTP {}", resp.status()),
            ))
        }
        Err(e) => {
            eprintln!("healthcheck error: {}", e);
            Err(io::Error::new(
                io::ErrorKind::Other,
                format!("healthcheck error: {}", e),
            ))
        }
    }
}

async fn handle_create_staff(
    config: &Config,
    username: &str,
    email: &str,
    password: &str,
) -> io::Result<()> {
    let to_io = |e: String| io::Error::new(io::ErrorKind::Other, e);

    let mut db_cfg = db_pool::DbConfig::for_service("blog-service", &config.database.url);
    db_cfg.max_connections = 2;
    db_cfg.min_connections = 0;
    let pool = db_pool::create_pool(db_cfg)
        .await
        .map_err(|e| to_io(format!("database connection failed: {}", e)))?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| to_io(format!("migrations failed: {}", e)))?;

    let user = AccountService::new(pool.clone())
        .create_staff(username, email, password)
        .await
        .map_err(|e| to_io(format!("could not create staff user: {}", e)))?;
    pool.close().await;

    println!("created staff user {} ({})", user.username, user.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> std::vec::IntoIter<String> {
        list.iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn test_no_command_starts_server() {
        assert_eq!(parse_command(args(&[])), Ok(None));
        assert_eq!(parse_command(args(&["--verbose"])), Ok(None));
    }

    #[test]
    fn test_healthcheck_aliases() {
        assert_eq!(parse_command(args(&["healthcheck"])), Ok(Some(Command::Healthcheck)));
        assert_eq!(
            parse_command(args(&["healthcheck-http"])),
            Ok(Some(Command::Healthcheck))
        );
    }

    #[test]
    fn test_create_staff_requires_three_arguments() {
        assert_eq!(
            parse_command(args(&["create-staff", "admin", "admin@example.com", "s3cret-pass"])),
            Ok(Some(Command::CreateStaff {
                username: "admin".into(),
                email: "admin@example.com".into(),
                password: "s3cret-pass".into(),
            }))
        );
        assert!(parse_command(args(&["create-staff", "admin"])).is_err());
    }
}
