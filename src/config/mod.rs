pub mod configs;
pub mod defaults;
pub mod envconfig;
pub mod validate;

pub use configs::{
    AppConfig, AuthConfig, CacheConfig, DatabaseConfig, GeneralConfig, JobsConfig, LoggingConfig,
    MailConfig, NotifyConfig,
};
pub use envconfig::EnvConfig;
