use async_trait::async_trait;
use echoes_core::error::SessionError;
use echoes_core::microphone::Microphone;

/// Keyboard mode: turns are typed, so there is nothing to acquire.
#[derive(Debug, Default)]
pub struct KeyboardInput;

#[async_trait]
impl Microphone for KeyboardInput {
    async fn acquire(&mut self) -> Result<(), SessionError> {
        Ok(())
    }

    fn release(&mut self) {}
}

/// Stands in for audio capture when this build has none.
#[derive(Debug)]
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    pub fn new(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl Microphone for Unavailable {
    async fn acquire(&mut self) -> Result<(), SessionError> {
        Err(SessionError::Permission(self.reason.clone()))
    }

    fn release(&mut self) {}
}

#[cfg(feature = "microphone")]
pub use capture::DeviceMicrophone;

#[cfg(feature = "microphone")]
mod capture {
    use super::*;
    use crate::config::INPUT_CHUNK_SIZE;
    use convai_realtime::types::audio::{Base64EncodedAudioBytes, USER_INPUT_PCM16_SAMPLE_RATE};
    use echoes_native_utils::{audio::ChunkEncoder, device};
    use tokio::sync::{mpsc, oneshot};

    /// Captures an input device on a dedicated thread and streams base64 PCM16 chunks.
    ///
    /// The cpal stream is not `Send`, so it lives and dies on its own thread.
    pub struct DeviceMicrophone {
        device_name: Option<String>,
        audio_tx: mpsc::Sender<Base64EncodedAudioBytes>,
        stop_tx: Option<std::sync::mpsc::Sender<()>>,
    }

    impl DeviceMicrophone {
        pub fn new(
            device_name: Option<String>,
            audio_tx: mpsc::Sender<Base64EncodedAudioBytes>,
        ) -> Self {
            Self {
                device_name,
                audio_tx,
                stop_tx: None,
            }
        }
    }

    fn capture(
        device_name: Option<String>,
        audio_tx: mpsc::Sender<Base64EncodedAudioBytes>,
        ready_tx: oneshot::Sender<anyhow::Result<()>>,
        stop_rx: std::sync::mpsc::Receiver<()>,
    ) {
        let started = device::get_or_default_input(device_name).and_then(|input| {
            let sample_rate = device::input_sample_rate(&input)?;
            let mut encoder = ChunkEncoder::new(
                sample_rate as f64,
                USER_INPUT_PCM16_SAMPLE_RATE,
                INPUT_CHUNK_SIZE,
            )?;
            let (stream, _) = device::start_mono_capture(&input, move |samples| {
                for chunk in encoder.push(&samples) {
                    if audio_tx.try_send(chunk).is_err() {
                        tracing::warn!("dropping microphone chunk, audio queue is full");
                    }
                }
            })?;
            Ok(stream)
        });

        match started {
            Ok(stream) => {
                if ready_tx.send(Ok(())).is_err() {
                    return;
                }
                // Blocks until released, or until the microphone itself is dropped.
                let _ = stop_rx.recv();
                drop(stream);
                tracing::info!("microphone capture stopped");
            }
            Err(e) => {
                tracing::error!("failed to start microphone capture: {:#}", e);
                let _ = ready_tx.send(Err(e));
            }
        }
    }

    #[async_trait]
    impl Microphone for DeviceMicrophone {
        async fn acquire(&mut self) -> Result<(), SessionError> {
            if self.stop_tx.is_some() {
                return Ok(());
            }
            let (ready_tx, ready_rx) = oneshot::channel();
            let (stop_tx, stop_rx) = std::sync::mpsc::channel();
            let device_name = self.device_name.clone();
            let audio_tx = self.audio_tx.clone();
            std::thread::spawn(move || capture(device_name, audio_tx, ready_tx, stop_rx));

            match ready_rx.await {
                Ok(Ok(())) => {
                    self.stop_tx = Some(stop_tx);
                    Ok(())
                }
                Ok(Err(e)) => Err(SessionError::Permission(format!("{:#}", e))),
                Err(_) => Err(SessionError::Permission(
                    "capture thread exited".to_string(),
                )),
            }
        }

        fn release(&mut self) {
            if let Some(stop_tx) = self.stop_tx.take() {
                let _ = stop_tx.send(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_keyboard_input_always_acquires() {
        let mut input = KeyboardInput;
        assert!(input.acquire().await.is_ok());
        input.release();
    }

    #[tokio::test]
    async fn test_unavailable_reports_permission_error() {
        let mut input = Unavailable::new("built without microphone support");
        let err = input.acquire().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Microphone access denied: built without microphone support"
        );
    }
}
