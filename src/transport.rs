//! Transport: the single duplex channel to the server, guarded by the
//! recursive mutex that admits exactly one request/response pair in flight
//! per lock acquisition.
//!
//! The concrete wire transport (UNIX socket, shared memory, ...) is mostly
//! out of scope here: this module specifies the contract as a trait and
//! ships one real implementation, a length-prefixed UNIX domain socket,
//! plus (in [`crate::testutil`]) a deterministic loopback used by tests.

use byteorder::{ReadBytesExt, WriteBytesExt, BE};
use parking_lot::ReentrantMutex;
use std::io::{Read, Write};
use std::sync::Arc;

/// A duplex channel to the server. Implementations own whatever OS resource
/// backs the channel.
///
/// Any I/O fault is fatal to the whole process: a half-sent request or
/// half-read response desynchronizes the framing of everything sent over
/// this channel afterwards, and there is no way to resume.
pub trait Transport: Send + Sync {
    /// Sends `request` and blocks until exactly one response has been read.
    fn raw_send_and_receive(&self, request: &[u8]) -> std::io::Result<Vec<u8>>;
}

/// Wraps a [`Transport`] with the recursive mutex the Invocation Engine
/// needs.
///
/// `ReentrantMutex` rather than `std::sync::Mutex`: a destructor that runs
/// while an outer call's critical section is still open (dropping an
/// unused vector-of-handle candidate during out-param write-back, say)
/// must be able to issue its own destroy message on the same thread. A
/// plain mutex would deadlock that thread against itself; a reentrant one
/// does not, and no other thread is let in regardless — no request from
/// another thread overtakes a prior one once both have crossed the lock.
///
/// The lock guards no shared state of its own: each call gets a freshly
/// allocated send buffer rather than a buffer cached on `Channel`, so a
/// nested acquisition from a drop glue running inside an outer `body`
/// never contends with the outer call's buffer. Sharing one cached buffer
/// across reentrant calls would need its own interior mutability (a
/// `RefCell`, say), and a `RefCell` does not know about `ReentrantMutex`'s
/// same-thread allowance — a genuinely nested call would hit its dynamic
/// borrow check and panic even though the mutex let it through.
pub struct Channel {
    transport: Box<dyn Transport>,
    critical_section: ReentrantMutex<()>,
}

impl Channel {
    pub fn new(transport: Box<dyn Transport>) -> Arc<Channel> {
        Arc::new(Channel {
            transport,
            critical_section: ReentrantMutex::new(()),
        })
    }

    /// Runs `body` holding the channel's critical section for its entire
    /// duration, handed a fresh scratch buffer. A nested call from within
    /// `body` (a handle's destroy-on-drop firing mid-response-decode, say)
    /// re-enters the same thread's hold on the lock and gets its own buffer
    /// in turn, never the outer call's.
    pub fn with_critical_section<R>(&self, body: impl FnOnce(&mut Vec<u8>) -> R) -> R {
        let _guard = self.critical_section.lock();
        let mut buf = Vec::new();
        body(&mut buf)
    }

    /// Performs exactly one send/receive round trip with the bytes
    /// currently in `buf`. Only meaningful called from within
    /// [`Channel::with_critical_section`].
    pub fn transceive(&self, buf: &[u8]) -> std::io::Result<Vec<u8>> {
        self.transport.raw_send_and_receive(buf)
    }
}

/// Real default transport: a UNIX domain socket, with each message
/// length-prefixed by a big-endian `u32` so the byte stream has frame
/// boundaries (the socket itself has none).
#[cfg(feature = "unix-transport")]
pub struct UnixSocketTransport {
    stream: parking_lot::Mutex<std::os::unix::net::UnixStream>,
}

#[cfg(feature = "unix-transport")]
impl UnixSocketTransport {
    pub fn connect<P: AsRef<std::path::Path>>(path: P) -> std::io::Result<UnixSocketTransport> {
        let stream = std::os::unix::net::UnixStream::connect(path)?;
        Ok(UnixSocketTransport {
            stream: parking_lot::Mutex::new(stream),
        })
    }
}

#[cfg(feature = "unix-transport")]
impl Transport for UnixSocketTransport {
    fn raw_send_and_receive(&self, request: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut stream = self.stream.lock();
        let len: u32 = request.len().try_into().map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "request too large to frame")
        })?;
        stream.write_u32::<BE>(len)?;
        stream.write_all(request)?;
        stream.flush()?;

        let response_len = stream.read_u32::<BE>()?;
        let mut response = vec![0u8; response_len as usize];
        stream.read_exact(&mut response)?;
        Ok(response)
    }
}

#[cfg(all(test, feature = "unix-transport"))]
mod tests {
    use super::*;
    use std::io::BufReader;
    use std::os::unix::net::UnixListener;

    #[test]
    fn length_prefixed_round_trip_over_a_real_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cryptoipc-test.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut writer = stream;
            let len = reader.read_u32::<BE>().unwrap();
            let mut body = vec![0u8; len as usize];
            std::io::Read::read_exact(&mut reader, &mut body).unwrap();
            writer.write_u32::<BE>(body.len() as u32).unwrap();
            writer.write_all(&body).unwrap();
        });

        let transport = UnixSocketTransport::connect(&path).unwrap();
        let echoed = transport.raw_send_and_receive(b"ping").unwrap();
        assert_eq!(echoed, b"ping");
        server.join().unwrap();
    }
}
