//! Length-prefixed framing over a [`Duplex`] stream, the receive pump
//! thread, and the serialized send path.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use execunit_config::ChannelConfig;
use execunit_tlv::Tlv;
use parking_lot::{Condvar, Mutex};

use crate::duplex::Duplex;
use crate::error::TransportError;
use crate::inbound::InboundHandler;

struct Shared<D> {
    active: AtomicBool,
    cancel: AtomicBool,
    writer: Mutex<D>,
    pump: Mutex<Option<JoinHandle<()>>>,
    pump_exited: Arc<(Mutex<bool>, Condvar)>,
    pump_join_timeout: Duration,
    max_frame_len: u32,
}

/// A live, framed, bidirectional channel over `D`, dispatching inbound
/// messages to `H`. Cloning is cheap (it's a handle to shared state) and
/// safe to use from any number of sender threads concurrently; there is
/// exactly one receive pump thread per instance.
pub struct FramedTransport<D: Duplex, H: InboundHandler> {
    inner: Arc<Shared<D>>,
    handler: Arc<H>,
}

impl<D: Duplex, H: InboundHandler> Clone for FramedTransport<D, H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            handler: self.handler.clone(),
        }
    }
}

impl<D: Duplex, H: InboundHandler> FramedTransport<D, H> {
    /// Perform the handshake read and start the pump thread over an
    /// already-connected `stream`. Resolving an endpoint name to a `D` is
    /// the caller's job (see [`crate::duplex::connect_unix`]). `config`
    /// supplies the pump-join deadline and the bound on an accepted frame's
    /// declared length. On any failure here the stream is dropped and
    /// nothing is left running.
    pub fn connect(
        mut stream: D,
        config: &ChannelConfig,
        handler: Arc<H>,
    ) -> Result<(Self, Vec<u8>), TransportError> {
        let max_frame_len = config.max_frame_len;
        let handshake = read_frame(&mut stream, max_frame_len)?.ok_or_else(|| {
            TransportError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "peer closed before sending the handshake frame",
            ))
        })?;

        let (handshake_tlv, consumed) =
            Tlv::parse(&handshake).map_err(|_| TransportError::BadHandshake)?;
        if consumed != handshake.len() {
            return Err(TransportError::BadHandshake);
        }
        let payload = handshake_tlv
            .as_bytes()
            .map_err(|_| TransportError::BadHandshake)?;

        let pump_stream = stream.try_clone()?;

        let shared = Arc::new(Shared {
            active: AtomicBool::new(true),
            cancel: AtomicBool::new(false),
            writer: Mutex::new(stream),
            pump: Mutex::new(None),
            pump_exited: Arc::new((Mutex::new(false), Condvar::new())),
            pump_join_timeout: config.pump_join_timeout(),
            max_frame_len,
        });

        let transport = Self {
            inner: shared.clone(),
            handler: handler.clone(),
        };

        let pump_handle = std::thread::Builder::new()
            .name("execunit-pump".into())
            .spawn(move || pump_loop(pump_stream, shared, handler))
            .map_err(TransportError::Io)?;
        *transport.inner.pump.lock() = Some(pump_handle);

        tracing::info!("transport connected, handshake payload {} bytes", payload.len());
        Ok((transport, payload))
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::Acquire)
    }

    /// Serialize and send `bytes` as one frame. `true` on success; `false`
    /// (and the transport marked inactive) on any I/O error.
    pub fn put_data(&self, bytes: &[u8]) -> bool {
        self.send_locked(|| (bytes.to_vec(), ())).is_some()
    }

    /// Run `build` to completion while holding the send mutex, then write
    /// the resulting bytes as one frame. `build` also returns an arbitrary
    /// `R` (e.g. the sequence number it allocated) that the caller gets
    /// back on success. Roles that must bundle sequence number allocation
    /// with wire position use this instead of `put_data` so the allocation
    /// happens inside the same critical section that decides the frame's
    /// position on the wire — `build` is not even invoked if the transport
    /// is already inactive, so failed sends never consume a sequence
    /// number.
    pub fn send_locked<R>(&self, build: impl FnOnce() -> (Vec<u8>, R)) -> Option<R> {
        if !self.is_active() {
            return None;
        }
        let mut writer = self.inner.writer.lock();
        if !self.is_active() {
            return None;
        }
        let (bytes, extra) = build();
        match write_frame(&mut *writer, &bytes) {
            Ok(()) => Some(extra),
            Err(e) => {
                tracing::warn!(error = %e, "transport write failed, marking inactive");
                self.inner.active.store(false, Ordering::Release);
                None
            }
        }
    }

    /// Idempotent shutdown: flips `active`, signals the pump to stop,
    /// closes the stream, and joins the pump thread within a bounded wait.
    pub fn close(&self) {
        if !self.inner.active.swap(false, Ordering::AcqRel) {
            return;
        }
        self.inner.cancel.store(true, Ordering::Release);

        {
            let writer = self.inner.writer.lock();
            let _ = writer.flush();
            let _ = writer.shutdown();
        }

        let (lock, cvar) = &*self.inner.pump_exited;
        let mut exited = lock.lock();
        let timed_out = if *exited {
            false
        } else {
            cvar.wait_for(&mut exited, self.inner.pump_join_timeout)
                .timed_out()
        };
        drop(exited);

        if let Some(handle) = self.inner.pump.lock().take() {
            if timed_out {
                // The pump never signalled `pump_exited` within the bound —
                // it is presumably still stuck in a blocking read despite
                // the stream shutdown above. Joining here has no deadline
                // of its own, so abandon the handle instead of blocking
                // forever on it; dropping a `JoinHandle` detaches the
                // thread rather than waiting for it.
                tracing::warn!(
                    "pump thread did not exit within {:?}; abandoning join",
                    self.inner.pump_join_timeout
                );
                drop(handle);
            } else {
                let _ = handle.join();
            }
        }
        tracing::info!("transport closed");
    }
}

fn pump_loop<D: Duplex, H: InboundHandler>(mut reader: D, shared: Arc<Shared<D>>, handler: Arc<H>) {
    tracing::debug!("receive pump started");
    loop {
        if !shared.active.load(Ordering::Acquire) || shared.cancel.load(Ordering::Acquire) {
            break;
        }
        match read_frame(&mut reader, shared.max_frame_len) {
            Ok(Some(body)) => match Tlv::parse(&body) {
                Ok((tlv, consumed)) if consumed == body.len() => {
                    let tlv_type = tlv.tlv_type();
                    if !handler.handle_incoming(tlv) {
                        tracing::debug!(tlv_type, "pump: unrecognized top-level TLV dropped");
                    }
                }
                Ok((tlv, consumed)) => {
                    tracing::warn!(
                        tlv_type = tlv.tlv_type(),
                        consumed,
                        frame_len = body.len(),
                        "pump: dropping frame with trailing garbage"
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, frame_len = body.len(), "pump: dropping malformed frame");
                }
            },
            Ok(None) => {
                tracing::debug!("pump: peer closed connection (EOF)");
                break;
            }
            Err(e) => {
                tracing::debug!(error = %e, "pump: read error, exiting");
                break;
            }
        }
    }
    shared.active.store(false, Ordering::Release);
    let (lock, cvar) = &*shared.pump_exited;
    *lock.lock() = true;
    cvar.notify_all();
    tracing::debug!("receive pump exited");
}

/// Read one frame: a 4-byte little-endian length followed by that many
/// bytes. `Ok(None)` on a clean EOF at the frame boundary. A declared
/// length over `max_frame_len` is rejected before the body allocation,
/// since the length prefix is attacker/peer-controlled and must never be
/// trusted to size an allocation unboundedly.
fn read_frame<R: Read>(reader: &mut R, max_frame_len: u32) -> io::Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    let len = u32::from_le_bytes(len_buf);
    if len > max_frame_len {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame length {len} exceeds max_frame_len {max_frame_len}"),
        ));
    }
    let mut body = vec![0u8; len as usize];
    if len > 0 {
        reader.read_exact(&mut body)?;
    }
    Ok(Some(body))
}

/// Write one frame. Callers never observe a partial frame: the length and
/// body are written back-to-back under the caller's held send-mutex guard.
fn write_frame<W: Write>(writer: &mut W, body: &[u8]) -> io::Result<()> {
    let len = body.len() as u32;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(body)?;
    writer.flush()
}
