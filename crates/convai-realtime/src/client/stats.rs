#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Stats {
    user_transcripts: u32,
    agent_responses: u32,
    audio_chunks: u32,
    audio_bytes: usize,
}

impl Stats {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_user_transcript(&mut self) {
        self.user_transcripts += 1;
    }

    pub(crate) fn record_agent_response(&mut self) {
        self.agent_responses += 1;
    }

    /// `encoded_len` is the length of the base64 payload, not of the decoded PCM.
    pub(crate) fn record_audio(&mut self, encoded_len: usize) {
        self.audio_chunks += 1;
        self.audio_bytes += encoded_len;
    }

    pub fn user_transcripts(&self) -> u32 {
        self.user_transcripts
    }

    pub fn agent_responses(&self) -> u32 {
        self.agent_responses
    }

    pub fn audio_chunks(&self) -> u32 {
        self.audio_chunks
    }

    pub fn audio_bytes(&self) -> usize {
        self.audio_bytes
    }
}
