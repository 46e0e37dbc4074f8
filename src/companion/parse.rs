//! Tolerant parsing of model output
//!
//! Models are asked for JSON, but may wrap it in code fences, prepend
//! prose, or fall back to `Label: value` lines. Nothing here panics or
//! fails on missing markers; callers get `None` or a default.

use serde::de::DeserializeOwned;

use crate::emotion::Emotion;
use crate::{Error, Result};

/// Max sentences kept in a spoken reply
pub const MAX_REPLY_SENTENCES: usize = 3;

#[derive(serde::Deserialize)]
struct EmotionJson {
    emotion: String,
}

/// Extract an emotion label from classifier output
///
/// Tries JSON, then an `Emotion:` marker, then any label word. Always
/// returns one of the nine labels.
#[must_use]
pub fn parse_emotion(raw: &str) -> Emotion {
    if let Some(parsed) = extract_json::<EmotionJson>(raw) {
        if let Ok(emotion) = parsed.emotion.parse() {
            return emotion;
        }
    }

    if let Some(value) = marker_value(raw, &["emotion", "detected emotion"]) {
        if let Ok(emotion) = value.trim_matches(|c: char| !c.is_alphabetic()).parse() {
            return emotion;
        }
    }

    Emotion::from_free_text(raw)
}

/// Clean generated reply text for speech
///
/// # Errors
///
/// Returns [`Error::Malformed`] when nothing speakable remains
pub fn clean_reply(raw: &str) -> Result<String> {
    let stripped = strip_code_fences(raw);
    let unquoted = stripped
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\u{201c}' || c == '\u{201d}');
    let collapsed = unquoted.split_whitespace().collect::<Vec<_>>().join(" ");
    let reply = first_sentences(&collapsed, MAX_REPLY_SENTENCES);

    if reply.is_empty() {
        return Err(Error::Malformed("model returned an empty reply".to_string()));
    }
    Ok(reply)
}

/// Keep at most `max` sentences
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace or the end.
#[must_use]
pub fn first_sentences(text: &str, max: usize) -> String {
    let text = text.trim();
    let mut count = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        match chars.peek() {
            Some((_, next)) if next.is_whitespace() => {}
            Some(_) => continue,
            None => break,
        }
        count += 1;
        if count == max {
            return text[..idx + c.len_utf8()].to_string();
        }
    }

    text.to_string()
}

/// Deserialize the first JSON object embedded in `raw`
#[must_use]
pub fn extract_json<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let body = strip_code_fences(raw);
    if let Ok(value) = serde_json::from_str(body.trim()) {
        return Some(value);
    }

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&body[start..=end]).ok()
}

/// Value after the first `Label:` line matching any of `labels`
///
/// Labels match case-insensitively and may be decorated with markdown
/// (`**Sentiment:** negative`).
#[must_use]
pub fn marker_value<'a>(raw: &'a str, labels: &[&str]) -> Option<&'a str> {
    raw.lines().find_map(|line| {
        let (label, value) = line.split_once(':')?;
        let label = label
            .trim()
            .trim_matches(|c: char| c == '*' || c == '#' || c == '-')
            .trim()
            .to_lowercase();
        if !labels.contains(&label.as_str()) {
            return None;
        }
        let value = value.trim().trim_matches('*').trim();
        (!value.is_empty()).then_some(value)
    })
}

/// Bullet or numbered items following a `Label:` line
///
/// Collection stops at the first blank line or the next `Label:` line.
#[must_use]
pub fn marker_list(raw: &str, labels: &[&str]) -> Vec<String> {
    let mut items = Vec::new();
    let mut in_section = false;

    for line in raw.lines() {
        let trimmed = line.trim();
        if !in_section {
            if let Some((label, rest)) = trimmed.split_once(':') {
                let label = label.trim_matches(|c: char| c == '*' || c == '#').trim().to_lowercase();
                if labels.contains(&label.as_str()) {
                    in_section = true;
                    let rest = rest.trim().trim_matches('*').trim();
                    if !rest.is_empty() {
                        items.push(rest.to_string());
                    }
                }
            }
            continue;
        }

        if trimmed.is_empty() {
            if items.is_empty() {
                continue;
            }
            break;
        }
        let item = strip_bullet(trimmed);
        if item.is_empty() {
            continue;
        }
        if trimmed == item && item.contains(':') {
            break;
        }
        items.push(item.to_string());
    }

    items
}

/// Remove a leading ``` fence (with optional language tag) and trailing fence
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn strip_bullet(line: &str) -> &str {
    let line = line.trim_start_matches(['-', '*', '\u{2022}']).trim_start();
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim();
        }
    }
    line.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emotion_from_json() {
        assert_eq!(parse_emotion(r#"{"emotion": "Anxious"}"#), Emotion::Anxious);
    }

    #[test]
    fn test_emotion_from_fenced_json() {
        let raw = "```json\n{\"emotion\": \"calm\"}\n```";
        assert_eq!(parse_emotion(raw), Emotion::Calm);
    }

    #[test]
    fn test_emotion_from_marker() {
        assert_eq!(parse_emotion("Emotion: Excited!\nReason: big news"), Emotion::Excited);
        assert_eq!(parse_emotion("**Emotion:** sad"), Emotion::Sad);
    }

    #[test]
    fn test_emotion_out_of_set_defaults() {
        assert_eq!(parse_emotion(r#"{"emotion": "melancholy"}"#), Emotion::Neutral);
        assert_eq!(parse_emotion(""), Emotion::Neutral);
        assert_eq!(parse_emotion("Sentiment: upbeat"), Emotion::Neutral);
    }

    #[test]
    fn test_clean_reply_caps_sentences() {
        let reply = clean_reply("That sounds hard. I'm here. Breathe slowly. You matter. Truly.").unwrap();
        assert_eq!(reply, "That sounds hard. I'm here. Breathe slowly.");
    }

    #[test]
    fn test_clean_reply_strips_quotes_and_whitespace() {
        let reply = clean_reply("  \"I'm glad\n you shared that!\"  ").unwrap();
        assert_eq!(reply, "I'm glad you shared that!");
    }

    #[test]
    fn test_clean_reply_empty_is_malformed() {
        assert!(matches!(clean_reply("  \"\" "), Err(Error::Malformed(_))));
    }

    #[test]
    fn test_first_sentences_ignores_inline_periods() {
        assert_eq!(first_sentences("It's 3.5 miles. Go slow. Rest. More.", 2), "It's 3.5 miles. Go slow.");
        assert_eq!(first_sentences("No terminator here", 3), "No terminator here");
    }

    #[test]
    fn test_extract_json_with_prose() {
        #[derive(serde::Deserialize)]
        struct Probe {
            a: u8,
        }
        let probe: Probe = extract_json("Sure! Here you go: {\"a\": 7} hope it helps").unwrap();
        assert_eq!(probe.a, 7);
        assert!(extract_json::<Probe>("no json at all").is_none());
        assert!(extract_json::<Probe>("} backwards {").is_none());
    }

    #[test]
    fn test_marker_value_missing_is_none() {
        assert!(marker_value("nothing useful", &["sentiment"]).is_none());
        assert!(marker_value("Sentiment:", &["sentiment"]).is_none());
        assert_eq!(marker_value("## Sentiment: Mixed", &["sentiment"]), Some("Mixed"));
    }

    #[test]
    fn test_marker_list_collects_bullets() {
        let raw = "Sentiment: negative\nRecommendations:\n- Take a walk\n2. Call a friend\n* Sleep early\n\nNotes: none";
        assert_eq!(
            marker_list(raw, &["recommendations"]),
            vec!["Take a walk", "Call a friend", "Sleep early"]
        );
    }

    #[test]
    fn test_marker_list_stops_at_next_label() {
        let raw = "Recommendations: Rest well\n- Drink water\nRisk: low";
        assert_eq!(marker_list(raw, &["recommendations"]), vec!["Rest well", "Drink water"]);
        assert!(marker_list("Sentiment: ok", &["recommendations"]).is_empty());
    }
}
