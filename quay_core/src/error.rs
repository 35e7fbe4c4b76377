use thiserror::Error;

/// Return for Quay operations that can succeed (OK) or fail (Err)
pub type Result<T> = std::result::Result<T, QuayError>;

/// All the possible errors from Quay operations
#[derive(Debug, Error)]
pub enum QuayError {
    /// Malformed direct or sentinel parameters, bad settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A system name that was never registered with the forum
    #[error("Unknown system name: {0}")]
    UnknownSystem(String),

    /// Indexed access to a key or field that is absent or undecodable
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    /// An operation the collection deliberately does not offer
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Sentinel discovery did not answer within the socket timeout
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl QuayError {
    /// Caller misuse or bad configuration; retrying will not help.
    pub fn is_misuse(&self) -> bool {
        use QuayError::*;
        matches!(self, Configuration(_) | UnknownSystem(_) | Unsupported(_) | Encode(_))
    }

    /// Transient backend trouble; the caller owns the retry policy.
    pub fn is_backend(&self) -> bool {
        use QuayError::*;
        matches!(self, Redis(_) | Pool(_) | Timeout(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, QuayError::NotFound(_))
    }
}

impl From<deadpool_redis::PoolError> for QuayError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        match err {
            deadpool_redis::PoolError::Backend(err) => QuayError::Redis(err),
            other => QuayError::Pool(other.to_string()),
        }
    }
}

impl From<deadpool_redis::CreatePoolError> for QuayError {
    fn from(err: deadpool_redis::CreatePoolError) -> Self {
        QuayError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_is_disjoint() {
        let misuse = QuayError::UnknownSystem("nope".to_string());
        assert!(misuse.is_misuse());
        assert!(!misuse.is_backend());
        assert!(!misuse.is_not_found());

        let missing = QuayError::NotFound("field".to_string());
        assert!(missing.is_not_found());
        assert!(!missing.is_misuse());

        let backend = QuayError::Pool("closed".to_string());
        assert!(backend.is_backend());
        assert!(!backend.is_misuse());
    }

    #[test]
    fn display_names_the_system() {
        let err = QuayError::UnknownSystem("analytics".to_string());
        assert_eq!(err.to_string(), "Unknown system name: analytics");
    }
}
