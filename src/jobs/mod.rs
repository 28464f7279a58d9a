pub mod daily_refresh;

pub use daily_refresh::{duration_until, refresh_all, run_daily_loop};
