use std::sync::Mutex;

use crate::config::FREQUENCY_SPLIT;

/// Atomically published pairing of the latest band array and loudness
/// scalar. What polling consumers see.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub bands: Vec<f32>,
    pub global_amp: f32,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            bands: vec![0.0; FREQUENCY_SPLIT],
            global_amp: 0.0,
        }
    }
}

/// Shared analysis output, written by the analysis thread and read by any
/// number of polling consumers.
///
/// Hand an `Arc<AnalysisState>` to both the engine and every consumer. The
/// band array is swapped wholesale under the lock, so a reader never sees a
/// mix of two frames; bands and global amplitude update on independent
/// cadences. Reads are non-blocking snapshots of the latest published values.
pub struct AnalysisState {
    snapshot: Mutex<Snapshot>,
}

impl AnalysisState {
    pub fn new() -> Self {
        Self {
            snapshot: Mutex::new(Snapshot::default()),
        }
    }

    /// Replace the whole band array with a freshly normalized frame.
    pub fn publish_bands(&self, bands: Vec<f32>) {
        self.snapshot.lock().unwrap().bands = bands;
    }

    pub fn publish_global_amp(&self, amp: f32) {
        self.snapshot.lock().unwrap().global_amp = amp;
    }

    /// Latest complete band array, zero-initialized before the first frame.
    pub fn bands(&self) -> Vec<f32> {
        self.snapshot.lock().unwrap().bands.clone()
    }

    /// Latest global amplitude, in [0, 5].
    pub fn global_amp(&self) -> f32 {
        self.snapshot.lock().unwrap().global_amp
    }

    /// Both values from the same instant.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.lock().unwrap().clone()
    }
}

impl Default for AnalysisState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_default_snapshot_is_zeroed() {
        let state = AnalysisState::new();
        assert_eq!(state.bands(), vec![0.0; FREQUENCY_SPLIT]);
        assert_eq!(state.global_amp(), 0.0);
    }

    #[test]
    fn test_publish_replaces_whole_frame() {
        let state = AnalysisState::new();
        state.publish_bands(vec![0.5; FREQUENCY_SPLIT]);
        state.publish_global_amp(2.0);

        let snap = state.snapshot();
        assert_eq!(snap.bands, vec![0.5; FREQUENCY_SPLIT]);
        assert_eq!(snap.global_amp, 2.0);
    }

    #[test]
    fn test_reader_never_sees_mixed_frame() {
        // Every published frame has all 16 elements equal, so any observed
        // mix of two frames would show up as a non-uniform array.
        let state = Arc::new(AnalysisState::new());

        let writer = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for frame in 0..2000u32 {
                    let value = frame as f32 / 2000.0;
                    state.publish_bands(vec![value; FREQUENCY_SPLIT]);
                }
            })
        };

        let reader = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for _ in 0..2000 {
                    let bands = state.bands();
                    assert_eq!(bands.len(), FREQUENCY_SPLIT);
                    let first = bands[0];
                    assert!(
                        bands.iter().all(|&b| b == first),
                        "observed a torn frame: {:?}",
                        bands
                    );
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
    }
}
