use miette::Diagnostic;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PostgresConfigError {
    #[error("postgres configuration environment variable(s) missing or invalid")]
    InvalidEnvironment(#[source] Box<figment::Error>),

    #[error("one of POSTGRES_PASSWORD or POSTGRES_PASSWORD_FILE must be provided")]
    MissingPassword,

    #[error("failed to read postgres password file {}", .path.display())]
    UnreadablePasswordFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "postgres password contains a non-terminal newline, which postgres would silently \
        truncate. Please use a password that does not contain non-terminal newlines."
    )]
    NewlineInPassword,
}

#[derive(Debug, PartialEq, Deserialize)]
struct PostgresConfig {
    user: String,
    password: Option<String>,
    password_file: Option<PathBuf>,
    db: String,
    host: Option<String>,
    port: Option<u16>,
}

/// Builds a connection url from `POSTGRES_USER`, `POSTGRES_PASSWORD` (or
/// `POSTGRES_PASSWORD_FILE`), `POSTGRES_DB` and the optional `POSTGRES_HOST`
/// (default `db`) and `POSTGRES_PORT`.
pub fn postgres_url_from_environment() -> Result<String, PostgresConfigError> {
    let provider = figment::providers::Env::prefixed("POSTGRES_");
    let postgres_config: PostgresConfig = figment::Figment::from(provider)
        .extract()
        .map_err(|e| PostgresConfigError::InvalidEnvironment(Box::new(e)))?;

    let password = if let Some(password) = postgres_config.password {
        password
    } else if let Some(path) = postgres_config.password_file {
        std::fs::read_to_string(&path)
            .map_err(|source| PostgresConfigError::UnreadablePasswordFile { path, source })?
    } else {
        return Err(PostgresConfigError::MissingPassword);
    };

    // A single trailing newline is almost always an artifact of how the
    // secret file was written, so it's dropped. Any other newline would be
    // truncated by postgres and is rejected.
    let password = password.strip_suffix('\n').unwrap_or(&password);
    if password.contains('\n') {
        return Err(PostgresConfigError::NewlineInPassword);
    }

    let password = utf8_percent_encode(password, NON_ALPHANUMERIC);
    let host = postgres_config.host.as_deref().unwrap_or("db");
    let port = postgres_config
        .port
        .map(|p| format!(":{p}"))
        .unwrap_or_default();

    Ok(format!(
        "postgres://{}:{}@{}{}/{}",
        postgres_config.user, password, host, port, postgres_config.db
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn builds_url_with_encoded_password() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("POSTGRES_USER", "sportsync");
            jail.set_env("POSTGRES_PASSWORD", "p@ss word");
            jail.set_env("POSTGRES_DB", "sports");

            let url = postgres_url_from_environment().expect("url should build");
            assert_eq!(url, "postgres://sportsync:p%40ss%20word@db/sports");
            Ok(())
        });
    }

    #[test]
    fn honors_host_and_port() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("POSTGRES_USER", "u");
            jail.set_env("POSTGRES_PASSWORD", "pw");
            jail.set_env("POSTGRES_DB", "d");
            jail.set_env("POSTGRES_HOST", "localhost");
            jail.set_env("POSTGRES_PORT", "5433");

            let url = postgres_url_from_environment().expect("url should build");
            assert_eq!(url, "postgres://u:pw@localhost:5433/d");
            Ok(())
        });
    }

    #[test]
    fn reads_password_file_and_trims_trailing_newline() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("pw.txt", "secret\n")?;
            jail.set_env("POSTGRES_USER", "u");
            jail.set_env("POSTGRES_PASSWORD_FILE", "pw.txt");
            jail.set_env("POSTGRES_DB", "d");

            let url = postgres_url_from_environment().expect("url should build");
            assert_eq!(url, "postgres://u:secret@db/d");
            Ok(())
        });
    }

    #[test]
    fn rejects_inner_newline() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("POSTGRES_USER", "u");
            jail.set_env("POSTGRES_PASSWORD", "sec\nret");
            jail.set_env("POSTGRES_DB", "d");

            let err = postgres_url_from_environment().unwrap_err();
            assert!(matches!(err, PostgresConfigError::NewlineInPassword));
            Ok(())
        });
    }

    #[test]
    fn requires_a_password() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("POSTGRES_USER", "u");
            jail.set_env("POSTGRES_DB", "d");

            let err = postgres_url_from_environment().unwrap_err();
            assert!(matches!(err, PostgresConfigError::MissingPassword));
            Ok(())
        });
    }
}
