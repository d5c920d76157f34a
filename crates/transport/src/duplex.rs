//! The duplex byte-stream contract the concrete transport must satisfy:
//! reliable, in-order, connection-oriented, blocking reads and writes, with
//! a detectable EOF/closed state. The producer of the actual pipe endpoint
//! (the agent-side server) is out of scope for this crate — we specify the
//! contract as a trait and ship one reference implementation.

use std::io::{self, Read, Write};
use std::time::Duration;

/// A duplex, reliable, in-order, connection-oriented byte stream.
///
/// Implementors must support being read from one thread (the receive pump)
/// while being written from others (serialized by `FramedTransport`'s send
/// mutex) concurrently — the same guarantee a Unix domain socket or a named
/// pipe gives for free. `try_clone` is how the pump obtains its own handle
/// to the same connection without contending with writers for a lock.
pub trait Duplex: Read + Write + Send + 'static {
    /// An independent handle to the same underlying connection.
    fn try_clone(&self) -> io::Result<Self>
    where
        Self: Sized;

    /// Best-effort: unblock a thread currently parked in `read`, and make
    /// further reads/writes fail. Must not block; callers swallow any
    /// error this returns.
    fn shutdown(&self) -> io::Result<()>;
}

#[cfg(unix)]
mod unix_socket {
    use super::Duplex;
    use std::io;
    use std::net::Shutdown;
    use std::os::unix::net::UnixStream;
    use std::path::Path;
    use std::time::Duration;

    impl Duplex for UnixStream {
        fn try_clone(&self) -> io::Result<Self> {
            UnixStream::try_clone(self)
        }

        fn shutdown(&self) -> io::Result<()> {
            UnixStream::shutdown(self, Shutdown::Both)
        }
    }

    /// Connect to a Unix domain socket path within `timeout`.
    ///
    /// `std::os::unix::net::UnixStream` has no connect-timeout parameter
    /// (unlike `TcpStream::connect_timeout`) because `connect(2)` on an
    /// `AF_UNIX` socket does not block the way a TCP three-way handshake
    /// does; `timeout` instead bounds how long we wait for the socket file
    /// to exist, which is the only part of a local Unix-socket connect that
    /// can realistically stall (the peer hasn't bound yet).
    pub fn connect_unix(path: impl AsRef<Path>, timeout: Duration) -> io::Result<UnixStream> {
        let path = path.as_ref();
        let deadline = std::time::Instant::now() + timeout;
        loop {
            match UnixStream::connect(path) {
                Ok(stream) => return Ok(stream),
                Err(e) if std::time::Instant::now() >= deadline => return Err(e),
                Err(_) => std::thread::sleep(Duration::from_millis(20)),
            }
        }
    }
}

#[cfg(unix)]
pub use unix_socket::connect_unix;

// A cross-platform named-endpoint transport (Windows named pipe / Unix
// domain socket via `interprocess`) was attempted here and dropped: every
// `Duplex` implementor must make `shutdown()` actually unblock a thread
// parked in the pump's `read` (see `FramedTransport::close`), and
// `interprocess`'s stream types expose no such primitive and no raw handle
// this crate could shut down out from under the pump's own cloned copy. A
// `shutdown()` that cannot unblock a blocked reader is worse than no
// implementation — `close()` would hang instead of erroring loudly. The
// Unix-domain-socket implementation above is the one built-in transport;
// an embedder targeting Windows must supply its own `Duplex` that can
// genuinely interrupt a blocked read (e.g. via `CancelIoEx`).
