//! memcached backend speaking the text protocol over TCP.

use crate::error::{KvError, KvResult};
use crate::traits::{KvStore, MAX_VALUE_SIZE, validate_key};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::instrument;

type Conn = BufStream<TcpStream>;

/// memcached key-value backend.
///
/// Connections are pooled up to `pool_size`; a connection that sees any
/// error is dropped rather than returned, so a broken socket never
/// poisons later operations. Every operation (including the dial) runs
/// under the configured timeout.
pub struct MemcachedBackend {
    addr: String,
    op_timeout: Duration,
    pool_size: usize,
    pool: Mutex<Vec<Conn>>,
}

impl MemcachedBackend {
    /// Create a new memcached backend. No connection is made until the
    /// first operation (or `health_check`).
    pub fn new(host: &str, port: u16, op_timeout: Duration, pool_size: usize) -> Self {
        Self {
            addr: format!("{host}:{port}"),
            op_timeout,
            pool_size,
            pool: Mutex::new(Vec::new()),
        }
    }

    /// Take a pooled connection or dial a new one.
    async fn checkout(&self) -> KvResult<Conn> {
        if let Some(conn) = self.pool.lock().await.pop() {
            return Ok(conn);
        }
        let stream = tokio::time::timeout(self.op_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| KvError::Timeout(self.op_timeout))??;
        stream.set_nodelay(true)?;
        Ok(BufStream::new(stream))
    }

    /// Return a healthy connection to the pool.
    async fn checkin(&self, conn: Conn) {
        let mut pool = self.pool.lock().await;
        if pool.len() < self.pool_size {
            pool.push(conn);
        }
    }

    /// Run one protocol exchange on a checked-out connection under the
    /// operation timeout. The connection is only pooled again when the
    /// exchange succeeds.
    async fn exchange<T, Fut>(&self, fut: impl FnOnce(Conn) -> Fut) -> KvResult<T>
    where
        Fut: Future<Output = KvResult<(Conn, T)>>,
    {
        let conn = self.checkout().await?;
        match tokio::time::timeout(self.op_timeout, fut(conn)).await {
            Ok(Ok((conn, value))) => {
                self.checkin(conn).await;
                Ok(value)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(KvError::Timeout(self.op_timeout)),
        }
    }
}

/// Read one CRLF-terminated response line, without the terminator.
async fn read_line(conn: &mut Conn) -> KvResult<String> {
    let mut line = Vec::new();
    let n = conn.read_until(b'\n', &mut line).await?;
    if n == 0 {
        return Err(KvError::Unavailable(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed by server",
        )));
    }
    while line.last().is_some_and(|b| *b == b'\n' || *b == b'\r') {
        line.pop();
    }
    String::from_utf8(line).map_err(|e| KvError::Protocol(format!("non-UTF-8 response: {e}")))
}

/// Map an error-report line to a protocol error, if it is one.
fn check_error_line(line: &str) -> KvResult<()> {
    if line == "ERROR" || line.starts_with("CLIENT_ERROR") || line.starts_with("SERVER_ERROR") {
        return Err(KvError::Protocol(line.to_string()));
    }
    Ok(())
}

async fn do_get(mut conn: Conn, key: String) -> KvResult<(Conn, Option<Bytes>)> {
    conn.write_all(format!("get {key}\r\n").as_bytes()).await?;
    conn.flush().await?;

    let line = read_line(&mut conn).await?;
    check_error_line(&line)?;
    if line == "END" {
        return Ok((conn, None));
    }

    // VALUE <key> <flags> <bytes>
    let parts: Vec<&str> = line.split_ascii_whitespace().collect();
    if parts.len() < 4 || parts[0] != "VALUE" {
        return Err(KvError::Protocol(format!("unexpected get response: {line}")));
    }
    let len: usize = parts[3]
        .parse()
        .map_err(|_| KvError::Protocol(format!("bad value length in: {line}")))?;
    if len > MAX_VALUE_SIZE {
        return Err(KvError::Protocol(format!(
            "value length {len} exceeds item ceiling"
        )));
    }

    let mut buf = vec![0u8; len + 2];
    conn.read_exact(&mut buf).await?;
    if &buf[len..] != b"\r\n" {
        return Err(KvError::Protocol("missing CRLF after value block".to_string()));
    }
    buf.truncate(len);

    let end = read_line(&mut conn).await?;
    if end != "END" {
        return Err(KvError::Protocol(format!("expected END, got: {end}")));
    }
    Ok((conn, Some(Bytes::from(buf))))
}

async fn do_set(mut conn: Conn, key: String, value: Bytes) -> KvResult<(Conn, ())> {
    conn.write_all(format!("set {key} 0 0 {}\r\n", value.len()).as_bytes())
        .await?;
    conn.write_all(&value).await?;
    conn.write_all(b"\r\n").await?;
    conn.flush().await?;

    let line = read_line(&mut conn).await?;
    check_error_line(&line)?;
    if line != "STORED" {
        return Err(KvError::Protocol(format!("unexpected set response: {line}")));
    }
    Ok((conn, ()))
}

async fn do_delete(mut conn: Conn, key: String) -> KvResult<(Conn, ())> {
    conn.write_all(format!("delete {key}\r\n").as_bytes())
        .await?;
    conn.flush().await?;

    let line = read_line(&mut conn).await?;
    check_error_line(&line)?;
    // NOT_FOUND means the key was already absent (or evicted); deletes
    // are idempotent, so both outcomes succeed.
    if line != "DELETED" && line != "NOT_FOUND" {
        return Err(KvError::Protocol(format!(
            "unexpected delete response: {line}"
        )));
    }
    Ok((conn, ()))
}

async fn do_version(mut conn: Conn) -> KvResult<(Conn, ())> {
    conn.write_all(b"version\r\n").await?;
    conn.flush().await?;

    let line = read_line(&mut conn).await?;
    check_error_line(&line)?;
    if !line.starts_with("VERSION") {
        return Err(KvError::Protocol(format!(
            "unexpected version response: {line}"
        )));
    }
    Ok((conn, ()))
}

#[async_trait]
impl KvStore for MemcachedBackend {
    #[instrument(skip(self), fields(backend = "memcached"))]
    async fn get(&self, key: &str) -> KvResult<Option<Bytes>> {
        validate_key(key)?;
        let key = key.to_string();
        self.exchange(move |conn| do_get(conn, key)).await
    }

    #[instrument(skip(self, value), fields(backend = "memcached", len = value.len()))]
    async fn set(&self, key: &str, value: Bytes) -> KvResult<()> {
        validate_key(key)?;
        if value.len() > MAX_VALUE_SIZE {
            return Err(KvError::ValueTooLarge {
                size: value.len(),
                max: MAX_VALUE_SIZE,
            });
        }
        let key = key.to_string();
        self.exchange(move |conn| do_set(conn, key, value)).await
    }

    #[instrument(skip(self), fields(backend = "memcached"))]
    async fn delete(&self, key: &str) -> KvResult<()> {
        validate_key(key)?;
        let key = key.to_string();
        self.exchange(move |conn| do_delete(conn, key)).await
    }

    fn backend_name(&self) -> &'static str {
        "memcached"
    }

    async fn health_check(&self) -> KvResult<()> {
        self.exchange(do_version).await
    }
}
