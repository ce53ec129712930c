use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use log::{info, warn};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::config::AnalyzerConfig;
use crate::error::CaptureError;

/// Callback receiving one full sample block at a time.
pub type BlockTap = Box<dyn FnMut(&[f32]) + Send>;

/// A source of fixed-size mono sample blocks.
///
/// Taps registered with `subscribe` are invoked in registration order for
/// every block the source delivers while started. `stop()` guarantees no tap
/// fires after it returns and clears all registered taps; both `start()` and
/// `stop()` are idempotent.
pub trait BlockSource {
    fn subscribe(&mut self, tap: BlockTap);
    fn start(&mut self) -> Result<(), CaptureError>;
    fn stop(&mut self);
    fn tap_count(&self) -> usize;
}

/// Accumulates arbitrary-length capture buffers into exact fixed-size blocks.
pub struct BlockChunker {
    block_size: usize,
    pending: Vec<f32>,
}

impl BlockChunker {
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            pending: Vec::with_capacity(block_size * 2),
        }
    }

    /// Feed samples in; get back every complete block they fill. Leftover
    /// samples stay pending for the next call.
    pub fn push(&mut self, samples: &[f32]) -> Vec<Vec<f32>> {
        self.pending.extend_from_slice(samples);

        let mut blocks = Vec::new();
        while self.pending.len() >= self.block_size {
            let rest = self.pending.split_off(self.block_size);
            blocks.push(std::mem::replace(&mut self.pending, rest));
        }
        blocks
    }
}

/// Microphone capture over the default cpal input device.
///
/// The device callback downmixes to mono, chunks samples into blocks, and
/// pushes them onto a bounded queue; a dedicated worker thread drains the
/// queue and invokes the taps. On queue overflow the oldest block is dropped
/// so latency stays bounded when analysis falls behind capture.
pub struct MicSource {
    device: Device,
    stream_config: StreamConfig,
    block_size: usize,
    queue_depth: usize,
    taps: Arc<Mutex<Vec<BlockTap>>>,
    stream: Option<Stream>,
    worker: Option<thread::JoinHandle<()>>,
}

impl MicSource {
    /// Resolve the default input device. Fails with `DeviceUnavailable` when
    /// no input device exists, `DeviceConfig` when it cannot be queried.
    pub fn new(config: &AnalyzerConfig) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::DeviceUnavailable)?;
        let supported = device.default_input_config()?;

        info!(
            "Using audio input device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );
        info!("Input config: {:?}", supported);

        Ok(Self {
            device,
            stream_config: supported.into(),
            block_size: config.fft_size,
            queue_depth: config.queue_depth,
            taps: Arc::new(Mutex::new(Vec::new())),
            stream: None,
            worker: None,
        })
    }

    fn build_stream(
        &self,
        sender: crossbeam_channel::Sender<Vec<f32>>,
        overflow: crossbeam_channel::Receiver<Vec<f32>>,
    ) -> Result<Stream, CaptureError> {
        let channels = self.stream_config.channels as usize;
        let mut chunker = BlockChunker::new(self.block_size);

        info!(
            "Creating input stream with {} channels at {} Hz",
            channels, self.stream_config.sample_rate.0
        );

        let stream = self.device.build_input_stream(
            &self.stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mono_data: Vec<f32> = if channels == 1 {
                    data.to_vec()
                } else {
                    data.chunks(channels)
                        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                        .collect()
                };

                for block in chunker.push(&mono_data) {
                    if sender.is_full() {
                        // Drop-oldest: latest audio matters more than backlog.
                        let _ = overflow.try_recv();
                    }
                    if sender.try_send(block).is_err() {
                        warn!("capture queue overflow, dropping block");
                    }
                }
            },
            |err| {
                warn!("Audio stream error: {}", err);
            },
            None,
        )?;

        Ok(stream)
    }
}

impl BlockSource for MicSource {
    fn subscribe(&mut self, tap: BlockTap) {
        self.taps.lock().unwrap().push(tap);
    }

    fn start(&mut self) -> Result<(), CaptureError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let (sender, receiver) = crossbeam_channel::bounded::<Vec<f32>>(self.queue_depth);
        let stream = self.build_stream(sender, receiver.clone())?;
        stream.play()?;

        let taps = Arc::clone(&self.taps);
        let worker = thread::spawn(move || {
            // Exits once the stream (and with it the sender) is dropped and
            // the queue has drained.
            while let Ok(block) = receiver.recv() {
                let mut taps = taps.lock().unwrap();
                for tap in taps.iter_mut() {
                    tap(&block);
                }
            }
        });

        self.stream = Some(stream);
        self.worker = Some(worker);
        info!("Microphone capture started");
        Ok(())
    }

    fn stop(&mut self) {
        // Dropping the stream stops the device callback and closes the
        // queue; joining the worker guarantees no tap fires after we return.
        self.stream.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        self.taps.lock().unwrap().clear();
    }

    fn tap_count(&self) -> usize {
        self.taps.lock().unwrap().len()
    }
}

impl Drop for MicSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// In-process source for tests: blocks are injected by hand instead of
/// arriving from a device.
#[cfg(test)]
pub(crate) struct SyntheticSource {
    inner: Arc<SyntheticInner>,
}

#[cfg(test)]
pub(crate) struct SyntheticHandle {
    inner: Arc<SyntheticInner>,
}

#[cfg(test)]
struct SyntheticInner {
    taps: Mutex<Vec<BlockTap>>,
    started: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl SyntheticSource {
    pub fn new() -> (Self, SyntheticHandle) {
        let inner = Arc::new(SyntheticInner {
            taps: Mutex::new(Vec::new()),
            started: std::sync::atomic::AtomicBool::new(false),
        });
        (
            Self {
                inner: Arc::clone(&inner),
            },
            SyntheticHandle { inner },
        )
    }
}

#[cfg(test)]
impl SyntheticHandle {
    /// Deliver one block to every tap, as a live source would.
    pub fn push_block(&self, block: &[f32]) {
        if !self.inner.started.load(std::sync::atomic::Ordering::SeqCst) {
            return;
        }
        let mut taps = self.inner.taps.lock().unwrap();
        for tap in taps.iter_mut() {
            tap(block);
        }
    }

    pub fn tap_count(&self) -> usize {
        self.inner.taps.lock().unwrap().len()
    }
}

#[cfg(test)]
impl BlockSource for SyntheticSource {
    fn subscribe(&mut self, tap: BlockTap) {
        self.inner.taps.lock().unwrap().push(tap);
    }

    fn start(&mut self) -> Result<(), CaptureError> {
        self.inner
            .started
            .store(true, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.inner
            .started
            .store(false, std::sync::atomic::Ordering::SeqCst);
        self.inner.taps.lock().unwrap().clear();
    }

    fn tap_count(&self) -> usize {
        self.inner.taps.lock().unwrap().len()
    }
}
