use std::time::Duration;

use stock_insight::cooldown::RefreshThrottle;

#[test]
fn test_second_refresh_within_window_is_rejected() {
    let throttle = RefreshThrottle::new(Duration::from_secs(60));

    assert!(throttle.check_ready("600000").is_ok());
    throttle.mark("600000");

    let remaining = throttle.check_ready("600000").unwrap_err();
    assert!(remaining <= 60);

    // A different code is unaffected
    assert!(throttle.check_ready("000001").is_ok());
}

#[test]
fn test_refresh_allowed_after_cooldown_elapses() {
    let throttle = RefreshThrottle::new(Duration::from_millis(50));

    assert!(throttle.check_ready("600000").is_ok());
    throttle.mark("600000");
    assert!(throttle.check_ready("600000").is_err());

    std::thread::sleep(Duration::from_millis(80));
    assert!(throttle.check_ready("600000").is_ok());
}

#[test]
fn test_unmarked_attempt_does_not_start_cooldown() {
    // check_ready alone must not arm the throttle; only a successful
    // refresh (mark) does, so failed refreshes can be retried at once.
    let throttle = RefreshThrottle::new(Duration::from_secs(60));
    assert!(throttle.check_ready("600000").is_ok());
    assert!(throttle.check_ready("600000").is_ok());
}

#[test]
fn test_reset_clears_all_state() {
    let throttle = RefreshThrottle::new(Duration::from_secs(60));
    throttle.mark("600000");
    throttle.mark("000001");

    throttle.reset();
    assert!(throttle.check_ready("600000").is_ok());
    assert!(throttle.check_ready("000001").is_ok());
}
