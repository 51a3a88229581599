pub const ELEVENLABS_API_KEY: &str = "ELEVENLABS_API_KEY";

pub const BASE_URL: &str = "https://api.elevenlabs.io/v1";
pub const SIGNED_URL_PATH: &str = "convai/conversation/get_signed_url";

pub const API_KEY_HEADER: &str = "xi-api-key";

pub const DEFAULT_CAPACITY: usize = 1024;
