use redis::aio::{ConnectionLike, MultiplexedConnection};
use redis::{Cmd, Pipeline, RedisFuture, Value};

/// A live handle to the backend of one system.
///
/// Direct systems hand out pooled connections; sentinel systems hand out a
/// dedicated connection to whichever node the sentinels named.
pub enum Connection {
    Pooled(deadpool_redis::Connection),
    Discovered(MultiplexedConnection),
}

impl ConnectionLike for Connection {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        match self {
            Connection::Pooled(conn) => conn.req_packed_command(cmd),
            Connection::Discovered(conn) => conn.req_packed_command(cmd),
        }
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        cmd: &'a Pipeline,
        offset: usize,
        count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        match self {
            Connection::Pooled(conn) => conn.req_packed_commands(cmd, offset, count),
            Connection::Discovered(conn) => conn.req_packed_commands(cmd, offset, count),
        }
    }

    fn get_db(&self) -> i64 {
        match self {
            Connection::Pooled(conn) => conn.get_db(),
            Connection::Discovered(conn) => conn.get_db(),
        }
    }
}
