#![allow(dead_code)]

use std::path::Path;

use stock_insight::config::Settings;
use stock_insight::AppState;
use tempfile::TempDir;

pub const TEST_WECHAT_TOKEN: &str = "testtoken";

pub fn test_settings(data_dir: &Path) -> Settings {
    Settings {
        app_name: "股票公告信息API服务".to_string(),
        version: "0.1.0".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        data_dir: data_dir.to_path_buf(),
        window_days: 10,
        pdf_max_chars: 500,
        refresh_cooldown_secs: 60,
        refresh_at: "07:30".to_string(),
        wechat_token: TEST_WECHAT_TOKEN.to_string(),
        llm_api_key: "test-key".to_string(),
        llm_base_url: "http://127.0.0.1:9".to_string(),
        llm_model: "qwen-plus".to_string(),
    }
}

/// Application state backed by a throwaway data directory. No network is
/// touched at construction time.
pub fn test_state() -> (AppState, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let settings = test_settings(dir.path());
    let state = AppState::initialize(&settings).expect("state init");
    (state, dir)
}
