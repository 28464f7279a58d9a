use anyhow::Result;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Mutex;

/// Embedded SQLite store for subscriptions and the summary-timestamp index.
/// Writes are short and synchronous; one connection behind a mutex.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join("subscriptions.db");
        let conn = Connection::open(db_path)?;
        let db = Database {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.lock();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS subscriptions (
                from_user TEXT PRIMARY KEY,
                stock_code_list TEXT NOT NULL DEFAULT '[]',
                updated_datetime TEXT
            );

            CREATE TABLE IF NOT EXISTS subscription_summaries (
                stock_code TEXT PRIMARY KEY,
                summary_updated_datetime TEXT
            );
            ",
        )?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Subscribed codes for one user, empty when the user is unknown.
    pub fn subscribed_codes(&self, from_user: &str) -> Result<BTreeSet<String>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT stock_code_list FROM subscriptions WHERE from_user = ?1")?;
        let mut rows = stmt.query(params![from_user])?;

        let Some(row) = rows.next()? else {
            return Ok(BTreeSet::new());
        };
        let payload: String = row.get(0)?;
        let codes: Vec<String> = serde_json::from_str(&payload).unwrap_or_default();
        Ok(codes.into_iter().collect())
    }

    pub fn replace_codes(
        &self,
        from_user: &str,
        codes: &BTreeSet<String>,
        now_iso: &str,
    ) -> Result<()> {
        let payload = serde_json::to_string(&codes.iter().collect::<Vec<_>>())?;
        let conn = self.lock();
        conn.execute(
            "INSERT INTO subscriptions(from_user, stock_code_list, updated_datetime)
             VALUES(?1, ?2, ?3)
             ON CONFLICT(from_user) DO UPDATE SET
                stock_code_list = excluded.stock_code_list,
                updated_datetime = excluded.updated_datetime",
            params![from_user, payload, now_iso],
        )?;
        Ok(())
    }

    /// All `(subscriber, codes)` rows, for the scheduled refresh.
    pub fn all_subscription_rows(&self) -> Result<Vec<(String, Vec<String>)>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT from_user, stock_code_list FROM subscriptions")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (from_user, payload) = row?;
            let codes: Vec<String> = serde_json::from_str(&payload).unwrap_or_default();
            result.push((from_user, codes));
        }
        Ok(result)
    }

    /// Record the last summary refresh time for a code.
    pub fn touch_summary(&self, stock_code: &str, now_iso: &str) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO subscription_summaries(stock_code, summary_updated_datetime)
             VALUES(?1, ?2)
             ON CONFLICT(stock_code) DO UPDATE SET
                summary_updated_datetime = excluded.summary_updated_datetime",
            params![stock_code, now_iso],
        )?;
        Ok(())
    }

    /// Batch timestamp lookup without touching any payload file.
    pub fn summary_timestamps(&self, codes: &[String]) -> Result<HashMap<String, String>> {
        if codes.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = codes.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!(
            "SELECT stock_code, summary_updated_datetime FROM subscription_summaries \
             WHERE stock_code IN ({})",
            placeholders
        );

        let conn = self.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(codes.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            ))
        })?;

        let mut mapping = HashMap::new();
        for row in rows {
            let (code, ts) = row?;
            mapping.insert(code, ts);
        }
        Ok(mapping)
    }
}
