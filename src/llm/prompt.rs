//! Prompt 组装：system 指令嵌入语气，user 指令嵌入原文

use crate::core::{GenerationRequest, Tone};
use crate::llm::Message;

pub fn system_instruction(tone: Tone) -> String {
    format!(
        "You are a helpful assistant that generates {} replies to messages. \
         Keep replies concise (under 150 words), appropriate, and natural. \
         Generate only the reply text without any additional commentary or explanations.",
        tone.label().to_lowercase()
    )
}

pub fn user_instruction(tone: Tone, message: &str) -> String {
    format!(
        "Generate a {} reply to this message:\n\n{}",
        tone.label().to_lowercase(),
        message
    )
}

/// 一次请求的完整消息序列
pub fn build_messages(request: &GenerationRequest) -> Vec<Message> {
    vec![
        Message::system(system_instruction(request.tone)),
        Message::user(user_instruction(request.tone, &request.message)),
    ]
}

/// 离线模式下的固定占位回复
pub fn offline_reply(tone: Tone) -> String {
    format!(
        "[Offline Mode - Demo Reply]\n\n\
         Thank you for your message. This is a sample reply generated in offline mode. \
         Please configure your API key and disable offline mode in Settings to use the AI generation feature.\n\n\
         Original tone requested: {}",
        tone.label()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ModelId;
    use crate::llm::Role;

    #[test]
    fn test_build_messages_embeds_tone_and_message() {
        let req = GenerationRequest::new(
            "Can we move the meeting to Friday?",
            Tone::Friendly,
            ModelId::default(),
        );
        let messages = build_messages(&req);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("friendly replies"));
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.ends_with("Can we move the meeting to Friday?"));
    }

    #[test]
    fn test_offline_reply_mentions_tone() {
        assert!(offline_reply(Tone::Formal).contains("Original tone requested: Formal"));
    }
}
