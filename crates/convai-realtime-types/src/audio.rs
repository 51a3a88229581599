/// Base64 encoded little-endian PCM16 audio, as carried by `audio` and `user_audio_chunk` frames.
pub type Base64EncodedAudioBytes = String;

/// Sample rate the provider expects for `user_audio_chunk` input unless the agent says otherwise.
pub const USER_INPUT_PCM16_SAMPLE_RATE: f64 = 16000.0;
