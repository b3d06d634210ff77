//! Sample sink - writes produced blocks on a dedicated thread
//!
//! The scheduler hands blocks over a bounded channel and never waits on I/O.
//! The sink writes little-endian f32, either plain levels or interleaved I/Q
//! with Q held at zero.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::OutputFormat;

/// Blocks buffered between the scheduler and the writer
const SINK_CHANNEL_CAPACITY: usize = 64;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to open output {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn sink thread: {0}")]
    Spawn(std::io::Error),
}

/// Statistics for the sink (atomic for thread-safe access)
#[derive(Debug, Default)]
pub struct SinkStats {
    pub blocks_written: AtomicU64,
    pub bytes_written: AtomicU64,
    pub blocks_dropped: AtomicU64,
}

/// Handle to the writer thread
pub struct SampleSink {
    block_tx: Option<Sender<Vec<f32>>>,
    running: Arc<AtomicBool>,
    stats: Arc<SinkStats>,
    handle: Option<JoinHandle<()>>,
}

impl SampleSink {
    /// Start writing to a file, or stdout when `path` is `None`
    pub fn start(path: Option<&Path>, format: OutputFormat) -> Result<Self, SinkError> {
        let writer: Box<dyn Write + Send> = match path {
            Some(path) => {
                let file = File::create(path).map_err(|source| SinkError::Open {
                    path: path.display().to_string(),
                    source,
                })?;
                info!("Writing {:?} samples to {}", format, path.display());
                Box::new(file)
            }
            None => {
                info!("Writing {:?} samples to stdout", format);
                Box::new(std::io::stdout())
            }
        };

        Self::spawn(writer, format)
    }

    /// Start writing to any writer
    pub fn spawn(writer: Box<dyn Write + Send>, format: OutputFormat) -> Result<Self, SinkError> {
        let (block_tx, block_rx) = bounded::<Vec<f32>>(SINK_CHANNEL_CAPACITY);
        let running = Arc::new(AtomicBool::new(true));
        let stats = Arc::new(SinkStats::default());

        let thread_running = running.clone();
        let thread_stats = stats.clone();
        let handle = thread::Builder::new()
            .name("sample-sink".to_string())
            .spawn(move || {
                if let Err(e) = run_sink(writer, format, block_rx, thread_running, thread_stats) {
                    error!("Sample sink error: {}", e);
                }
            })
            .map_err(SinkError::Spawn)?;

        Ok(Self {
            block_tx: Some(block_tx),
            running,
            stats,
            handle: Some(handle),
        })
    }

    /// Queue a block without blocking; full or closed channels drop it
    pub fn submit(&self, block: Vec<f32>) -> bool {
        let Some(tx) = &self.block_tx else {
            return false;
        };

        match tx.try_send(block) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("Sink channel full, dropping block");
                self.stats.blocks_dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("Sink thread gone, dropping block");
                self.stats.blocks_dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> &Arc<SinkStats> {
        &self.stats
    }

    /// Close the channel, let the writer drain what is queued, and join it
    pub fn stop(&mut self) {
        self.block_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Sample sink thread panicked");
            }
        }
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Drop for SampleSink {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Serialize one block into `bytes`
fn encode_block(block: &[f32], format: OutputFormat, bytes: &mut Vec<u8>) {
    bytes.clear();
    match format {
        OutputFormat::Real => {
            bytes.reserve(block.len() * 4);
            for sample in block {
                bytes.extend_from_slice(&sample.to_le_bytes());
            }
        }
        OutputFormat::Complex => {
            bytes.reserve(block.len() * 8);
            for sample in block {
                bytes.extend_from_slice(&sample.to_le_bytes());
                bytes.extend_from_slice(&0.0f32.to_le_bytes());
            }
        }
    }
}

/// Writer loop (runs in dedicated thread)
fn run_sink(
    writer: Box<dyn Write + Send>,
    format: OutputFormat,
    block_rx: Receiver<Vec<f32>>,
    running: Arc<AtomicBool>,
    stats: Arc<SinkStats>,
) -> std::io::Result<()> {
    let mut writer = BufWriter::new(writer);
    let mut bytes = Vec::new();

    let result = loop {
        match block_rx.recv_timeout(Duration::from_millis(500)) {
            Ok(block) => {
                encode_block(&block, format, &mut bytes);
                if let Err(e) = writer.write_all(&bytes) {
                    break Err(e);
                }
                stats.blocks_written.fetch_add(1, Ordering::Relaxed);
                stats.bytes_written.fetch_add(bytes.len() as u64, Ordering::Relaxed);
            }
            Err(RecvTimeoutError::Timeout) => {
                // Keep a slow consumer (pipe) from holding stale samples
                if let Err(e) = writer.flush() {
                    break Err(e);
                }
            }
            Err(RecvTimeoutError::Disconnected) => break Ok(()),
        }
    };

    running.store(false, Ordering::SeqCst);
    let flushed = writer.flush();

    info!(
        "Sample sink stopped. Blocks={}, Bytes={}",
        stats.blocks_written.load(Ordering::Relaxed),
        stats.bytes_written.load(Ordering::Relaxed)
    );

    result.and(flushed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Writer that keeps everything in shared memory
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn test_encode_real() {
        let mut bytes = Vec::new();
        encode_block(&[1.0, 0.0, 1.0], OutputFormat::Real, &mut bytes);
        assert_eq!(bytes.len(), 12);
        assert_eq!(floats(&bytes), vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_encode_complex_zero_q() {
        let mut bytes = Vec::new();
        encode_block(&[1.0, 0.0], OutputFormat::Complex, &mut bytes);
        assert_eq!(floats(&bytes), vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_sink_writes_blocks_in_order() {
        let buffer = SharedBuffer::default();
        let mut sink = SampleSink::spawn(Box::new(buffer.clone()), OutputFormat::Real).unwrap();

        assert!(sink.submit(vec![1.0, 1.0]));
        assert!(sink.submit(vec![0.0, 1.0, 0.0]));
        sink.stop();

        let written = buffer.0.lock().unwrap().clone();
        assert_eq!(floats(&written), vec![1.0, 1.0, 0.0, 1.0, 0.0]);
        assert_eq!(sink.stats().blocks_written.load(Ordering::Relaxed), 2);
        assert_eq!(sink.stats().bytes_written.load(Ordering::Relaxed), 20);
        assert!(!sink.is_running());
    }

    #[test]
    fn test_submit_after_stop_is_rejected() {
        let mut sink =
            SampleSink::spawn(Box::new(SharedBuffer::default()), OutputFormat::Complex).unwrap();
        sink.stop();
        assert!(!sink.submit(vec![1.0]));
    }
}
