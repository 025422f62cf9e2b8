use std::env;

/// Application configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set".to_string())?;

        let run_migrations = parse_flag(
            "RUN_MIGRATIONS",
            &env::var("RUN_MIGRATIONS").unwrap_or_else(|_| "true".to_string()),
        )?;

        Ok(Config {
            database_url,
            run_migrations,
        })
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("{} must be a boolean, got: {}", name, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag_accepts_common_spellings() {
        assert_eq!(parse_flag("RUN_MIGRATIONS", "true"), Ok(true));
        assert_eq!(parse_flag("RUN_MIGRATIONS", " ON "), Ok(true));
        assert_eq!(parse_flag("RUN_MIGRATIONS", "0"), Ok(false));
        assert_eq!(parse_flag("RUN_MIGRATIONS", "No"), Ok(false));
    }

    #[test]
    fn test_parse_flag_names_the_variable_on_error() {
        let err = parse_flag("RUN_MIGRATIONS", "maybe").unwrap_err();
        assert!(err.contains("RUN_MIGRATIONS"));
        assert!(err.contains("maybe"));
    }
}
