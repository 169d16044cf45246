//! Serial link
//!
//! Adapts an async byte stream to the synchronous collaborator traits of the
//! protocol core:
//!
//! ```text
//!  SerialStream ──read──▶ reader task ──mpsc──▶ LinkInput  (ByteSource)
//!  SerialStream ◀─write── writer task ◀─mpsc── LinkOutput (RequestSink)
//! ```
//!
//! Neither side blocks the scheduling cycle: `LinkInput::pump` drains what
//! the reader task has forwarded so far, `LinkOutput` only queues frames.
//! Both channels are bounded. When the local buffer is full the pump stops
//! draining, the reader task waits on the channel and the UART driver
//! absorbs the rest.
//!
//! Either task ending on EOF or an I/O error cancels the link's `closed`
//! token so the polling task can stop instead of polling a dead port.

use std::collections::VecDeque;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_serial::SerialPortBuilderExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use voltage_khf::{ByteSource, KhfError, RequestSink};

use crate::config::SerialConfig;
use crate::error::Result;

const READ_CHUNK: usize = 256;

/// Chunks queued between the reader task and the polling task
pub const INBOUND_CHANNEL_CAPACITY: usize = 100;

/// Request frames queued for the writer task
pub const OUTBOUND_CHANNEL_CAPACITY: usize = 16;

/// Bytes held locally before the pump stops draining the channel
pub const MAX_BUFFERED: usize = 4096;

/// Inbound half: bytes forwarded by the reader task
#[derive(Debug)]
pub struct LinkInput {
    rx: mpsc::Receiver<Vec<u8>>,
    buffer: VecDeque<u8>,
}

impl LinkInput {
    pub fn new(rx: mpsc::Receiver<Vec<u8>>) -> Self {
        Self {
            rx,
            buffer: VecDeque::new(),
        }
    }

    /// Move chunks received so far into the local buffer, stopping once
    /// [`MAX_BUFFERED`] bytes are held
    pub fn pump(&mut self) -> usize {
        let mut moved = 0;
        while self.buffer.len() < MAX_BUFFERED {
            match self.rx.try_recv() {
                Ok(chunk) => {
                    moved += chunk.len();
                    self.buffer.extend(chunk);
                },
                Err(_) => break,
            }
        }
        if self.buffer.len() >= MAX_BUFFERED {
            debug!("Serial input backlog at {} bytes", self.buffer.len());
        }
        moved
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

impl ByteSource for LinkInput {
    fn available(&self) -> bool {
        !self.buffer.is_empty()
    }

    fn read(&mut self) -> Option<u8> {
        self.buffer.pop_front()
    }
}

/// Outbound half: request frames queued for the writer task
#[derive(Debug, Clone)]
pub struct LinkOutput {
    tx: mpsc::Sender<String>,
}

impl LinkOutput {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }
}

impl RequestSink for LinkOutput {
    fn write_request(&mut self, frame: &str) -> voltage_khf::Result<()> {
        self.tx.try_send(frame.to_string()).map_err(|e| match e {
            TrySendError::Full(_) => KhfError::transport("serial writer backlogged"),
            TrySendError::Closed(_) => KhfError::transport("serial writer closed"),
        })
    }
}

/// Both halves plus the I/O tasks behind them
#[derive(Debug)]
pub struct SerialLink {
    pub input: LinkInput,
    pub output: LinkOutput,
    closed: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl SerialLink {
    /// Open the configured UART
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let stream = tokio_serial::new(&config.port, config.baud_rate)
            .data_bits(config.parse_data_bits())
            .parity(config.parse_parity())
            .stop_bits(config.parse_stop_bits())
            .open_native_async()?;
        info!("Serial port opened: {} @ {} baud", config.port, config.baud_rate);
        Ok(Self::spawn_io(stream))
    }

    /// Run reader and writer tasks over any async byte stream
    pub fn spawn_io<T>(io: T) -> Self
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(io);
        let (in_tx, in_rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);
        let (out_tx, out_rx) = mpsc::channel(OUTBOUND_CHANNEL_CAPACITY);
        let closed = CancellationToken::new();

        let tasks = vec![
            tokio::spawn(read_loop(reader, in_tx, closed.clone())),
            tokio::spawn(write_loop(writer, out_rx, closed.clone())),
        ];

        Self {
            input: LinkInput::new(in_rx),
            output: LinkOutput::new(out_tx),
            closed,
            tasks,
        }
    }

    /// Cancelled once the reader or writer task has given up on the stream
    pub fn closed_token(&self) -> CancellationToken {
        self.closed.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Stop the I/O tasks
    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        debug!("Serial link closed");
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn read_loop<R>(mut reader: R, tx: mpsc::Sender<Vec<u8>>, closed: CancellationToken)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                warn!("Serial stream closed");
                break;
            },
            Ok(n) => {
                trace!("Read {} bytes", n);
                if tx.send(buf[..n].to_vec()).await.is_err() {
                    break;
                }
            },
            Err(e) => {
                error!("Serial read failed: {}", e);
                break;
            },
        }
    }
    closed.cancel();
}

async fn write_loop<W>(mut writer: W, mut rx: mpsc::Receiver<String>, closed: CancellationToken)
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = rx.recv().await {
        if let Err(e) = writer.write_all(frame.as_bytes()).await {
            error!("Serial write failed: {}", e);
            break;
        }
        if let Err(e) = writer.flush().await {
            error!("Serial flush failed: {}", e);
            break;
        }
    }
    closed.cancel();
}
