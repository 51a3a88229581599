use echoes_core::SessionUpdate;
use echoes_core::topic::Topic;
use echoes_core::transcript::Role;

/// Renders a session update as one terminal line.
pub fn render(update: &SessionUpdate, topic: &Topic, agent_name: &str) -> String {
    match update {
        SessionUpdate::Transcript(item) => match item.role {
            Role::User => format!("You: {}", item.message),
            Role::Agent => format!("{}: {}", agent_name, item.message),
        },
        SessionUpdate::ImageFocus(index) => match topic.images.get(*index) {
            Some(image) => format!("[image {}] {} ({})", index + 1, image.context, image.src),
            None => format!("[image {}]", index + 1),
        },
        SessionUpdate::Orb(orb) => format!("[{}]", orb),
        SessionUpdate::Error(message) => format!("Error: {}", message),
    }
}
