//! Hand-off to the external speech collaborator.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use crate::Result;

/// Text-to-speech backend. Implementations may block until playback ends.
pub trait SpeechSink: Send + Sync + 'static {
    fn speak(&self, text: &str) -> Result<()>;
}

/// Forwards utterances to a [`SpeechSink`] on a worker thread, one at a time.
///
/// Requests made while an utterance is still playing are dropped, never
/// queued.
pub struct VoiceChannel<S> {
    sink: Arc<S>,
    busy: Arc<AtomicBool>,
}

impl<S: SpeechSink> VoiceChannel<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink: Arc::new(sink),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Starts speaking `text` unless the channel is busy. Returns the worker
    /// handle when the request was accepted.
    pub fn request(&self, text: impl Into<String>) -> Option<JoinHandle<()>> {
        let text = text.into();
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(%text, "voice channel busy, dropping utterance");
            return None;
        }

        let sink = Arc::clone(&self.sink);
        let guard = BusyGuard(Arc::clone(&self.busy));
        let handle = thread::spawn(move || {
            let _guard = guard;
            if let Err(err) = sink.speak(&text) {
                tracing::warn!(%err, "speech synthesis failed");
            }
        });

        Some(handle)
    }
}

impl<S> std::fmt::Debug for VoiceChannel<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceChannel")
            .field("busy", &self.busy.load(Ordering::Relaxed))
            .finish()
    }
}

/// Clears the busy flag when the worker finishes, even on panic.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        mpsc::{self, Receiver},
        Mutex,
    };

    use super::*;
    use crate::NatyaError;

    struct GatedSink {
        spoken: Mutex<Vec<String>>,
        release: Mutex<Receiver<()>>,
    }

    impl SpeechSink for GatedSink {
        fn speak(&self, text: &str) -> Result<()> {
            self.release
                .lock()
                .map_err(|_| NatyaError::msg("release channel poisoned"))?
                .recv()
                .map_err(|_| NatyaError::msg("release sender dropped"))?;
            self.spoken.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct FailingSink;

    impl SpeechSink for FailingSink {
        fn speak(&self, _text: &str) -> Result<()> {
            Err(NatyaError::msg("no audio device"))
        }
    }

    #[test]
    fn drops_requests_while_speaking() {
        let (release, gate) = mpsc::channel();
        let channel = VoiceChannel::new(GatedSink {
            spoken: Mutex::new(Vec::new()),
            release: Mutex::new(gate),
        });

        let first = channel.request("Reduce Left Knee angle").expect("idle channel");
        assert!(channel.is_busy());
        assert!(channel.request("Increase Back angle").is_none());

        release.send(()).unwrap();
        first.join().unwrap();
        assert!(!channel.is_busy());

        let second = channel.request("Increase Back angle").expect("idle again");
        release.send(()).unwrap();
        second.join().unwrap();

        let spoken = channel.sink.spoken.lock().unwrap().clone();
        assert_eq!(spoken, ["Reduce Left Knee angle", "Increase Back angle"]);
    }

    #[test]
    fn sink_errors_release_the_channel() {
        let channel = VoiceChannel::new(FailingSink);
        channel.request("hello").unwrap().join().unwrap();
        assert!(!channel.is_busy());
        assert!(channel.request("again").is_some());
    }
}
