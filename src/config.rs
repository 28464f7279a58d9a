use std::env;
use std::path::PathBuf;

/// Runtime configuration, read once from the environment (plus `.env` via
/// dotenvy in the binaries). Every value has a default so the service runs
/// without any configuration except the secrets.
#[derive(Debug, Clone)]
pub struct Settings {
    pub app_name: String,
    pub version: String,
    pub bind_addr: String,
    pub data_dir: PathBuf,
    /// Trailing announcement window in calendar days, today inclusive
    pub window_days: u32,
    /// Hard cap on extracted PDF text, in characters
    pub pdf_max_chars: usize,
    /// Minimum interval between two manual refreshes of the same code
    pub refresh_cooldown_secs: u64,
    /// Daily refresh time of day, Beijing time, "HH:MM"
    pub refresh_at: String,
    /// WeChat Official Account callback token
    pub wechat_token: String,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Settings {
    pub fn from_env() -> Self {
        Settings {
            app_name: env_or("APP_NAME", "股票公告信息API服务"),
            version: env!("CARGO_PKG_VERSION").to_string(),
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:8000"),
            data_dir: PathBuf::from(env_or("DATA_DIR", "./data")),
            window_days: env_or("ANNOUNCEMENT_WINDOW_DAYS", "10")
                .parse()
                .unwrap_or(10),
            pdf_max_chars: env_or("PDF_MAX_CHARS", "500").parse().unwrap_or(500),
            refresh_cooldown_secs: env_or("REFRESH_COOLDOWN_SECS", "60")
                .parse()
                .unwrap_or(60),
            refresh_at: env_or("DAILY_REFRESH_AT", "07:30"),
            wechat_token: env_or("WECHAT_TOKEN", ""),
            llm_api_key: env_or("DASHSCOPE_API_KEY", ""),
            llm_base_url: env_or(
                "LLM_BASE_URL",
                "https://dashscope.aliyuncs.com/compatible-mode/v1",
            ),
            llm_model: env_or("LLM_MODEL", "qwen-plus"),
        }
    }
}
