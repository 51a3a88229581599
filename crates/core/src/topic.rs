use serde::{Deserialize, Serialize};

/// Display and voice configuration of a topic's conversational agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub name: String,
    pub traits: Vec<String>,
    pub voice_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicImage {
    pub src: String,
    /// Human-readable caption.
    pub context: String,
    pub keywords: Vec<String>,
}

impl TopicImage {
    /// True when any keyword occurs in `lowercase_text`, which the caller has already lowercased.
    fn mentioned_in(&self, lowercase_text: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| lowercase_text.contains(&keyword.to_lowercase()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub background_image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiki_title: Option<String>,
    /// Knowledge-base document the agent retrieves from.
    pub document_id: String,
    pub persona: Persona,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_instructions: Option<String>,
    pub dynamic_first_message: String,
    pub dynamic_system_prompt: String,
    pub images: Vec<TopicImage>,
}

impl Topic {
    /// First image, in declaration order, with a keyword contained in `text`.
    ///
    /// Matching is a case-insensitive substring test; keywords are tried in declaration
    /// order within each image. Declaration order decides ties, not position in `text`.
    pub fn find_relevant_image(&self, text: &str) -> Option<&TopicImage> {
        let text = text.to_lowercase();
        self.images.iter().find(|image| image.mentioned_in(&text))
    }

    /// Position of the first image whose `src` equals `src`.
    pub fn image_index(&self, src: &str) -> Option<usize> {
        self.images.iter().position(|image| image.src == src)
    }

    /// Carousel position for `text`, if any image is relevant to it.
    pub fn relevant_image_index(&self, text: &str) -> Option<usize> {
        self.find_relevant_image(text)
            .and_then(|image| self.image_index(&image.src))
    }

    pub fn summary(&self) -> TopicSummary {
        TopicSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            summary: self.summary.clone(),
            background_image: self.background_image.clone(),
            persona: self.persona.clone(),
            images: self.images.clone(),
        }
    }
}

/// The public face of a topic: everything except the agent prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSummary {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub background_image: String,
    pub persona: Persona,
    pub images: Vec<TopicImage>,
}
