use chrono::{DateTime, Utc};
use std::sync::Arc;
use tempfile::TempDir;

use stock_insight::cache::SummaryCache;
use stock_insight::db::Database;
use stock_insight::models::{ModelInfo, SummaryResult};
use stock_insight::subscriptions::SubscriptionStore;

fn open_store() -> (Arc<Database>, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let db = Arc::new(Database::new(dir.path()).expect("open db"));
    (db, dir)
}

fn summary(content: &str) -> SummaryResult {
    SummaryResult {
        summary: "针对股票：600000的公告总结".to_string(),
        content: content.to_string(),
        word_count: content.chars().count(),
        model_info: ModelInfo {
            model: "qwen-plus".to_string(),
            provider: "百炼大模型".to_string(),
            status: "已生成".to_string(),
        },
    }
}

#[test]
fn test_cache_round_trip() {
    let (db, dir) = open_store();
    let cache = SummaryCache::new(db, dir.path()).unwrap();

    let before = Utc::now();
    assert!(cache.get_timestamps(&["600000".to_string()]).is_empty());

    cache.save("600000", &summary("X")).unwrap();
    assert_eq!(cache.load_text("600000"), "X");

    let ts_map = cache.get_timestamps(&["600000".to_string()]);
    let ts = ts_map.get("600000").expect("timestamp recorded");
    let parsed = DateTime::parse_from_rfc3339(ts).expect("iso-8601 timestamp");
    assert!(parsed.with_timezone(&Utc) > before);
}

#[test]
fn test_cache_overwrites_payload() {
    let (db, dir) = open_store();
    let cache = SummaryCache::new(db, dir.path()).unwrap();

    cache.save("600000", &summary("第一版")).unwrap();
    cache.save("600000", &summary("第二版")).unwrap();
    assert_eq!(cache.load_text("600000"), "第二版");
}

#[test]
fn test_cache_load_falls_back_to_summary_field() {
    let (db, dir) = open_store();
    let cache = SummaryCache::new(db, dir.path()).unwrap();

    cache.save("600000", &summary("")).unwrap();
    assert_eq!(cache.load_text("600000"), "针对股票：600000的公告总结");
}

#[test]
fn test_cache_missing_entry_is_empty() {
    let (db, dir) = open_store();
    let cache = SummaryCache::new(db, dir.path()).unwrap();
    assert_eq!(cache.load_text("999999"), "");
}

#[test]
fn test_cache_batch_timestamps_skip_unknown_codes() {
    let (db, dir) = open_store();
    let cache = SummaryCache::new(db, dir.path()).unwrap();

    cache.save("600000", &summary("X")).unwrap();
    let ts_map = cache.get_timestamps(&["600000".to_string(), "000001".to_string()]);
    assert_eq!(ts_map.len(), 1);
    assert!(ts_map.contains_key("600000"));
}

#[test]
fn test_subscription_add_del_list() {
    let (db, _dir) = open_store();
    let store = SubscriptionStore::new(db);

    assert_eq!(store.add_code("user_a", "600000").unwrap(), "已订阅 600000");
    assert_eq!(
        store.add_code("user_a", "600000").unwrap(),
        "600000 已在订阅列表"
    );
    assert_eq!(store.add_code("user_a", "000001").unwrap(), "已订阅 000001");

    // Sorted listing
    assert_eq!(store.list_codes("user_a").unwrap(), vec!["000001", "600000"]);

    assert_eq!(
        store.del_code("user_a", "600000").unwrap(),
        "已取消订阅 600000"
    );
    assert_eq!(
        store.del_code("user_a", "600000").unwrap(),
        "600000 不在订阅列表"
    );
    assert_eq!(store.list_codes("user_a").unwrap(), vec!["000001"]);
}

#[test]
fn test_subscription_rejects_malformed_codes() {
    let (db, _dir) = open_store();
    let store = SubscriptionStore::new(db);

    assert_eq!(
        store.add_code("user_a", "123").unwrap(),
        "股票代码格式不正确，应为6位数字"
    );
    assert_eq!(
        store.del_code("user_a", "60000a").unwrap(),
        "股票代码格式不正确，应为6位数字"
    );
    assert!(store.list_codes("user_a").unwrap().is_empty());
}

#[test]
fn test_subscription_all_rows_for_scheduler() {
    let (db, _dir) = open_store();
    let store = SubscriptionStore::new(db);

    store.add_code("user_a", "600000").unwrap();
    store.add_code("user_b", "600000").unwrap();
    store.add_code("user_b", "000001").unwrap();

    let mut rows = store.all_rows().unwrap();
    rows.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].0, "user_a");
    assert_eq!(rows[0].1, vec!["600000"]);
    assert_eq!(rows[1].1, vec!["000001", "600000"]);
}
