use tracing::warn;

use crate::{Connection, DEFAULT_SYSTEM, Forum, Result, escape_glob};

/// Keys fetched per `SCAN` round trip
const SCAN_COUNT: usize = 100;

/// A forum narrowed down to one logical system.
///
/// Cheap to clone; every collection holds one and resolves a connection
/// through it on each operation, so a failover is picked up on the next call.
#[derive(Clone)]
pub struct Context {
    forum: Forum,
    system: String,
}

impl Context {
    pub fn new(forum: Forum, system: impl ToString) -> Self {
        Self {
            forum,
            system: system.to_string(),
        }
    }

    /// Context for the default system of a forum built from the environment
    pub fn try_from_env() -> Result<Self> {
        let forum = Forum::try_from_env()?;
        Ok(Self::new(forum, DEFAULT_SYSTEM))
    }

    /// Writable connection; the current master when running behind sentinels
    pub async fn get_connection(&self) -> Result<Connection> {
        self.forum.resolve(&self.system, true).await
    }

    /// Read-only connection; a replica when running behind sentinels
    pub async fn get_replica_connection(&self) -> Result<Connection> {
        self.forum.resolve(&self.system, false).await
    }

    /// Names of all keys starting with `prefix`, with the prefix stripped.
    ///
    /// Walks the keyspace with `SCAN`, so keys added or deleted meanwhile
    /// may or may not show up. Keys that are not UTF-8 are skipped.
    pub async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut conn = self.get_connection().await?;
        let pattern = format!("{}*", escape_glob(prefix));

        let mut names = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<Vec<u8>>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;
            names.extend(batch.into_iter().filter_map(|key| strip_key(key, prefix)));
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // a key can be reported more than once while the keyspace rehashes
        names.sort();
        names.dedup();
        Ok(names)
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn forum(&self) -> &Forum {
        &self.forum
    }

    /// Same forum, different system
    pub fn clone_for_system(&self, system: impl ToString) -> Self {
        Self::new(self.forum.clone(), system)
    }
}

/// The part of `key` after `prefix`, if the key is UTF-8 and carries it
fn strip_key(key: Vec<u8>, prefix: &str) -> Option<String> {
    let key = match String::from_utf8(key) {
        Ok(key) => key,
        Err(err) => {
            warn!(prefix = %prefix, key = ?err.as_bytes(), "Skipping key that is not UTF-8");
            return None;
        }
    };
    key.strip_prefix(prefix).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_lose_their_prefix() {
        assert_eq!(strip_key(b"job:42".to_vec(), "job:"), Some("42".to_string()));
        assert_eq!(strip_key(b"job:".to_vec(), "job:"), Some(String::new()));
        assert_eq!(strip_key(b"other:42".to_vec(), "job:"), None);
    }

    #[test]
    fn keys_that_are_not_utf8_are_skipped() {
        let mut key = b"job:".to_vec();
        key.push(0xff);
        assert_eq!(strip_key(key, "job:"), None);
    }
}
