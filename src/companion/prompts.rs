//! Prompt templates for classification, replies, and journal analysis

use crate::emotion::Emotion;

/// Persona and style rules for spoken replies
pub const REPLY_SYSTEM_PROMPT: &str = "You are Haven, a warm and supportive companion who listens. \
Reply in one to three short sentences that sound natural when spoken aloud. \
Validate the user's feelings before anything else. \
Never give medical, diagnostic, or medication advice. \
If the user seems distressed you may offer one simple grounding idea, such as slow breathing \
or noticing five things they can see. Do not use lists, markdown, or emoji.";

/// Instruction for emotion classification
pub const CLASSIFY_SYSTEM_PROMPT: &str = "You classify the dominant emotion in a short message. \
Answer only with JSON.";

/// Instruction for journal analysis
pub const JOURNAL_SYSTEM_PROMPT: &str = "You review private journal entries for a wellbeing app. \
You never diagnose. Answer only with JSON.";

/// Build the emotion classification prompt
#[must_use]
pub fn classify_prompt(text: &str) -> String {
    format!(
        "Classify the dominant emotion of this message as exactly one of: {labels}.\n\
         Respond as {{\"emotion\": \"<label>\"}}.\n\n\
         Message: \"{text}\"",
        labels = Emotion::label_list(),
        text = quote_safe(text),
    )
}

/// Build the reply prompt for a transcript and its detected emotion
#[must_use]
pub fn reply_prompt(text: &str, emotion: Emotion) -> String {
    let grounding = if emotion.is_distressed() {
        " A gentle grounding suggestion may help."
    } else {
        ""
    };

    format!(
        "The user seems to be feeling {emotion}.{grounding}\n\
         They said: \"{text}\"\n\
         Respond to them directly.",
        text = quote_safe(text),
    )
}

/// Build the journal analysis prompt
#[must_use]
pub fn journal_prompt(content: &str, mood: &str, intensity: u8) -> String {
    format!(
        "Analyze this journal entry. The writer reported mood \"{mood}\" at intensity {intensity}/10.\n\
         Respond as {{\"sentiment\": \"positive|neutral|negative|mixed\", \
         \"risk_level\": \"low|moderate|high\", \
         \"recommendations\": [\"<up to three short, kind suggestions>\"]}}.\n\n\
         Entry: \"{content}\"",
        mood = quote_safe(mood),
        content = quote_safe(content),
    )
}

/// Keep user text from closing the surrounding quotes
fn quote_safe(text: &str) -> String {
    text.trim().replace('"', "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_prompt_lists_all_labels() {
        let prompt = classify_prompt("I'm fine");
        for emotion in Emotion::ALL {
            assert!(prompt.contains(emotion.as_str()));
        }
        assert!(prompt.contains("\"emotion\""));
    }

    #[test]
    fn test_reply_prompt_grounding_only_when_distressed() {
        assert!(reply_prompt("ugh", Emotion::Stressed).contains("grounding"));
        assert!(!reply_prompt("yay", Emotion::Happy).contains("grounding"));
    }

    #[test]
    fn test_user_quotes_neutralized() {
        let prompt = reply_prompt("she said \"leave\"", Emotion::Sad);
        assert!(prompt.contains("she said 'leave'"));
    }
}
