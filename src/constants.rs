pub const API_BASE_URL: &str = "http://20.244.56.144/evaluation-service";
pub const TOKEN_ENV_VAR: &str = "STOCK_API_TOKEN";
pub const DEFAULT_WINDOW_MINUTES: u32 = 60;
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
pub const SYNTHETIC_SEED: u64 = 0x5EED_CAFE;
