use anyhow::{Result, bail};

use super::AppConfig;

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if cfg.general.host.trim().is_empty() {
        errors.push("general.host must not be empty".to_string());
    }

    if let Some(database) = cfg.database.as_ref() {
        if database.url.trim().is_empty() {
            errors.push("database.url must not be empty".to_string());
        }

        if database.min_idle > database.max_connections {
            errors.push(format!(
                "database.min_idle ({}) must be <= database.max_connections ({})",
                database.min_idle, database.max_connections
            ));
        }
    }

    if let Some(auth) = cfg.auth.as_ref() {
        if auth.admin_email.trim().is_empty() {
            errors.push("auth.admin_email must not be empty".to_string());
        }

        if auth.admin_password.len() < 8 {
            errors.push("auth.admin_password must be at least 8 characters".to_string());
        }

        if auth.jwt_secret.trim().is_empty() {
            errors.push("auth.jwt_secret must not be empty".to_string());
        }
    }

    if let Some(mail) = cfg.mail.as_ref() {
        if mail.smtp_host.trim().is_empty() {
            errors.push("mail.smtp_host must not be empty".to_string());
        }

        if mail.from_address.trim().is_empty() {
            errors.push("mail.from_address must not be empty".to_string());
        }
    }

    if cfg.jobs.exports_dir.trim().is_empty() {
        errors.push("jobs.exports_dir must not be empty".to_string());
    }

    if cfg.jobs.reminder_interval_hours == 0 {
        errors.push("jobs.reminder_interval_hours must be > 0".to_string());
    }

    if cfg.jobs.inactive_after_days <= 0 {
        errors.push("jobs.inactive_after_days must be > 0".to_string());
    }

    if cfg.cache.listing_ttl_secs == 0 {
        errors.push("cache.listing_ttl_secs must be > 0".to_string());
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid app config:\n- {}", errors.join("\n- "))
}

#[cfg(test)]
mod tests {
    use super::validate;
    use crate::config::{AppConfig, AuthConfig, DatabaseConfig};

    fn base_config() -> AppConfig {
        AppConfig::default()
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn rejects_empty_host() {
        let mut cfg = base_config();
        cfg.general.host = "  ".to_string();

        let err = validate(&cfg).expect_err("validation should fail");
        assert!(err.to_string().contains("general.host"));
    }

    #[test]
    fn rejects_min_idle_above_max_connections() {
        let mut cfg = base_config();
        cfg.database = Some(DatabaseConfig {
            url: "postgres://localhost/parkhub".to_string(),
            max_connections: 2,
            min_idle: 5,
        });

        let err = validate(&cfg).expect_err("validation should fail");
        assert!(err.to_string().contains("database.min_idle"));
    }

    #[test]
    fn rejects_short_admin_password() {
        let mut cfg = base_config();
        cfg.auth = Some(AuthConfig {
            jwt_secret: "secret".to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_password: "short".to_string(),
            admin_username: "admin".to_string(),
        });

        let err = validate(&cfg).expect_err("validation should fail");
        assert!(err.to_string().contains("admin_password"));
    }

    #[test]
    fn rejects_zero_listing_ttl() {
        let mut cfg = base_config();
        cfg.cache.listing_ttl_secs = 0;

        let err = validate(&cfg).expect_err("validation should fail");
        assert!(err.to_string().contains("cache.listing_ttl_secs"));
    }
}
