//! NDN face over a Unix stream socket.
//!
//! Outbound packets sent before the connection completes are buffered and
//! drained in FIFO order once the socket is up. The receive side reassembles
//! TLV frames from the byte stream in a bounded buffer; a full buffer with no
//! complete TLV closes the connection.

use crate::{Face, FetchError, MAX_RECEIVE_BUFFER};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use log::{debug, trace, warn};
use ndn_bundle_common::name::Name;
use ndn_bundle_common::packet::{Data, Interest, Nack};
use ndn_bundle_common::tlv;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tokio::time::timeout;

struct PendingInterest {
    name: Name,
    tx: oneshot::Sender<Result<Data, FetchError>>,
}

enum WriteState {
    /// Connection in progress; outbound blocks queue in FIFO order.
    Buffering(VecDeque<Bytes>),
    Ready(OwnedWriteHalf),
    Closed(String),
}

struct Inner {
    pending: Mutex<Vec<PendingInterest>>,
    writer: AsyncMutex<WriteState>,
}

/// An NDN client face over a Unix stream socket.
pub struct UnixFace {
    inner: Arc<Inner>,
}

impl UnixFace {
    /// Creates a face and starts connecting to the forwarder socket at
    /// `path`. Interests expressed before the connection completes are
    /// queued and sent once it does.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let inner = Arc::new(Inner {
            pending: Mutex::new(Vec::new()),
            writer: AsyncMutex::new(WriteState::Buffering(VecDeque::new())),
        });

        let path = path.into();
        tokio::spawn(connect_task(Arc::clone(&inner), path));

        Self { inner }
    }

    async fn send_block(&self, block: Bytes) -> Result<(), FetchError> {
        let mut writer = self.inner.writer.lock().await;
        match &mut *writer {
            WriteState::Buffering(queue) => {
                trace!("Face not yet connected, queueing {} bytes", block.len());
                queue.push_back(block);
                Ok(())
            }
            WriteState::Ready(half) => {
                if let Err(e) = half.write_all(&block).await {
                    let reason = format!("send failed: {}", e);
                    *writer = WriteState::Closed(reason.clone());
                    drop(writer);
                    fail_pending(&self.inner, &reason);
                    return Err(FetchError::Closed(reason));
                }
                Ok(())
            }
            WriteState::Closed(reason) => Err(FetchError::Closed(reason.clone())),
        }
    }
}

#[async_trait]
impl Face for UnixFace {
    async fn express_interest(&self, interest: Interest) -> Result<Data, FetchError> {
        let mut interest = interest;
        if interest.nonce() == 0 {
            // a normalized (decoded without nonce) interest gets a fresh one
            interest.refresh_nonce();
        }

        let wire = interest
            .wire_encode()
            .map_err(|e| FetchError::Closed(format!("encode failed: {}", e)))?;
        let lifetime = Duration::from_millis(interest.lifetime_ms());
        let name = interest.name().clone();

        debug!("Express Interest: {}", name);

        let (tx, rx) = oneshot::channel();
        self.inner.pending.lock().unwrap().push(PendingInterest {
            name: name.clone(),
            tx,
        });

        self.send_block(wire).await?;

        match timeout(lifetime, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(FetchError::Closed("face dropped".into())),
            Err(_) => {
                debug!("Interest timed out: {}", name);
                self.inner
                    .pending
                    .lock()
                    .unwrap()
                    .retain(|p| !p.name.eq(&name));
                Err(FetchError::Timeout)
            }
        }
    }

    async fn put_data(&self, data: Data) -> Result<(), FetchError> {
        let mut data = data;
        let wire = data
            .wire_encode()
            .map_err(|e| FetchError::Closed(format!("encode failed: {}", e)))?;
        debug!("Send Data: {}", data.name());
        self.send_block(wire).await
    }
}

async fn connect_task(inner: Arc<Inner>, path: PathBuf) {
    match UnixStream::connect(&path).await {
        Ok(stream) => {
            debug!("Connected to forwarder at {}", path.display());
            let (read_half, mut write_half) = stream.into_split();

            // drain the queue in FIFO order before any new send
            let mut writer = inner.writer.lock().await;
            let queued = match std::mem::replace(&mut *writer, WriteState::Closed(String::new())) {
                WriteState::Buffering(queue) => queue,
                other => {
                    *writer = other;
                    return;
                }
            };
            for block in &queued {
                if let Err(e) = write_half.write_all(block).await {
                    let reason = format!("send failed while draining queue: {}", e);
                    *writer = WriteState::Closed(reason.clone());
                    drop(writer);
                    fail_pending(&inner, &reason);
                    return;
                }
            }
            *writer = WriteState::Ready(write_half);
            drop(writer);

            receive_loop(inner, read_half).await;
        }
        Err(e) => {
            let reason = format!("connect to {} failed: {}", path.display(), e);
            warn!("{}", reason);
            close(&inner, reason).await;
        }
    }
}

async fn receive_loop(inner: Arc<Inner>, mut read_half: OwnedReadHalf) {
    let mut buffer = BytesMut::with_capacity(MAX_RECEIVE_BUFFER);
    let mut chunk = [0u8; 2048];

    loop {
        let n = match read_half.read(&mut chunk).await {
            Ok(0) => {
                close(&inner, "connection closed by peer".into()).await;
                return;
            }
            Ok(n) => n,
            Err(e) => {
                close(&inner, format!("receive failed: {}", e)).await;
                return;
            }
        };
        buffer.extend_from_slice(&chunk[..n]);

        loop {
            match tlv::complete_element_len(&buffer) {
                Ok(Some(len)) => {
                    let frame = buffer.split_to(len).freeze();
                    dispatch(&inner, frame);
                }
                Ok(None) => break,
                Err(e) => {
                    close(&inner, format!("invalid TLV on the wire: {}", e)).await;
                    return;
                }
            }
        }

        if buffer.len() >= MAX_RECEIVE_BUFFER {
            close(
                &inner,
                "frame-overflow: reassembly buffer full without a complete TLV".into(),
            )
            .await;
            return;
        }
    }
}

fn dispatch(inner: &Arc<Inner>, frame: Bytes) {
    match frame[0] {
        tlv::TLV_DATA => match Data::wire_decode(&frame) {
            Ok(data) => {
                trace!("Received Data: {}", data.name());
                let mut pending = inner.pending.lock().unwrap();
                let mut i = 0;
                while i < pending.len() {
                    if pending[i].name.is_prefix_of(data.name()) {
                        let entry = pending.swap_remove(i);
                        let _ = entry.tx.send(Ok(data.clone()));
                    } else {
                        i += 1;
                    }
                }
            }
            Err(e) => warn!("Dropping malformed Data frame: {}", e),
        },
        tlv::TLV_NACK => match Nack::wire_decode(&frame) {
            Ok(nack) => {
                trace!("Received Nack for {}", nack.interest().name());
                let mut pending = inner.pending.lock().unwrap();
                let mut i = 0;
                while i < pending.len() {
                    if &pending[i].name == nack.interest().name() {
                        let entry = pending.swap_remove(i);
                        let _ = entry
                            .tx
                            .send(Err(FetchError::Nack(nack.interest().name().to_string())));
                    } else {
                        i += 1;
                    }
                }
            }
            Err(e) => warn!("Dropping malformed Nack frame: {}", e),
        },
        other => trace!("Ignoring frame with TLV type {}", other),
    }
}

async fn close(inner: &Arc<Inner>, reason: String) {
    debug!("Closing face: {}", reason);
    let mut writer = inner.writer.lock().await;
    *writer = WriteState::Closed(reason.clone());
    drop(writer);
    fail_pending(inner, &reason);
}

fn fail_pending(inner: &Arc<Inner>, reason: &str) {
    let mut pending = inner.pending.lock().unwrap();
    for entry in pending.drain(..) {
        let _ = entry.tx.send(Err(FetchError::Closed(reason.to_string())));
    }
}
