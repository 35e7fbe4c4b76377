use quay_core::{Context, Forum, get_redis_url};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn create_test_context() -> Context {
    let redis_url = get_redis_url();
    Forum::with_url(&redis_url)
        .expect("Failed to configure Redis")
        .system("default")
}

/// A key nobody else is using, so parallel test runs do not collide
pub fn unique_key(name: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("quay:test:{}:{}:{}", name, std::process::id(), nanos)
}
