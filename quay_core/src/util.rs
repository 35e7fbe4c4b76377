/// Redis URL used when neither `QUAY_REDIS_URL` nor `REDIS_URL` is set
pub const FALLBACK_REDIS_URL: &str = "redis://localhost:6379";

/// A standardized way to read QUAY_REDIS_URL env var with REDIS_URL as fallback
pub fn get_redis_url() -> String {
    std::env::var("QUAY_REDIS_URL")
        .or_else(|_| std::env::var("REDIS_URL"))
        .unwrap_or_else(|_| FALLBACK_REDIS_URL.to_string())
}

/// Escape glob metacharacters so `prefix` matches literally in `SCAN MATCH`
pub fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
