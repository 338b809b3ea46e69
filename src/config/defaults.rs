pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: i64 = 3000;
pub const DEFAULT_RUST_LOG: &str = "info,tower_http=info";
pub const DEFAULT_DB_MAX_CONNECTIONS: i64 = 10;
pub const DEFAULT_DB_MIN_IDLE: i64 = 2;
pub const DEFAULT_EXPORTS_DIR: &str = "exports";
pub const DEFAULT_EXPORT_KEEP_DAYS: i64 = 7;
pub const DEFAULT_REMINDER_INTERVAL_HOURS: i64 = 24;
pub const DEFAULT_INACTIVE_AFTER_DAYS: i64 = 7;
pub const DEFAULT_LISTING_TTL_SECS: i64 = 30;
