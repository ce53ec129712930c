use thiserror::Error;

/// Failures opening or starting the audio input device.
///
/// These surface once from `start()` and are not retried; repeated
/// `start()`/`stop()` calls in an already-reached state are no-ops, not
/// errors.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no audio input device available")]
    DeviceUnavailable,

    #[error("failed to query input config: {0}")]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to open input stream: {0}")]
    DeviceOpen(#[from] cpal::BuildStreamError),

    #[error("device opened but capture could not begin: {0}")]
    DeviceStart(#[from] cpal::PlayStreamError),
}
