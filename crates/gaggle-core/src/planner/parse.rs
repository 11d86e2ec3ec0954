//! Pulling structured itineraries out of model output.
//!
//! Models wrap JSON in code fences or surround it with prose, so parsing is
//! lenient about *where* the JSON is and strict about its shape once found.

use serde_json::Value;

use crate::error::PlannerError;
use crate::itinerary::ItineraryItem;

/// Keys under which a replacement itinerary may appear in a revision reply.
const ITINERARY_KEYS: &[&str] = &["itinerary", "updatedItinerary", "updated_itinerary"];
const MESSAGE_KEYS: &[&str] = &["message", "reply", "response"];

/// Outcome of a chat revision call.
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionReply {
    /// Text to show in the chat transcript.
    pub message: String,
    /// Present only when the model sent a full replacement itinerary.
    pub itinerary: Option<Vec<ItineraryItem>>,
}

/// Remove a surrounding Markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`, `JSON`, ...) on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn parse_container(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(|v| v.is_array() || v.is_object())
}

/// Body of the first fenced block anywhere in `text`.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let (_, body) = text[start + 3..].split_once('\n')?;
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// Find the JSON array or object in `text`.
///
/// Tried in order: the whole text (fences stripped), a fenced block after
/// leading prose, then the span from the earliest `[` or `{` to the last
/// matching closer.
pub fn extract_json(text: &str) -> Option<Value> {
    if let Some(value) = parse_container(strip_code_fences(text)) {
        return Some(value);
    }
    if let Some(value) = fenced_block(text).and_then(parse_container) {
        return Some(value);
    }

    let mut spans: Vec<(usize, char)> = [('[', ']'), ('{', '}')]
        .into_iter()
        .filter_map(|(open, close)| text.find(open).map(|start| (start, close)))
        .collect();
    spans.sort_unstable();

    spans.into_iter().find_map(|(start, close)| {
        let end = text.rfind(close)?;
        (start < end)
            .then(|| parse_container(&text[start..=end]))
            .flatten()
    })
}

/// Decode a generation result. Accepts a bare array or an object carrying
/// one of the itinerary keys; anything else is malformed.
pub fn parse_itinerary(value: Value) -> Result<Vec<ItineraryItem>, PlannerError> {
    let array = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match ITINERARY_KEYS.iter().find_map(|k| map.remove(*k)) {
            Some(Value::Array(items)) => items,
            _ => return Err(PlannerError::Malformed("expected an itinerary array".into())),
        },
        _ => return Err(PlannerError::Malformed("expected an itinerary array".into())),
    };
    decode_items(array)
}

fn decode_items(values: Vec<Value>) -> Result<Vec<ItineraryItem>, PlannerError> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            serde_json::from_value(v)
                .map_err(|e| PlannerError::Malformed(format!("itinerary item {i}: {e}")))
        })
        .collect()
}

/// Parse the text of a generation call.
pub fn parse_generation_text(text: &str) -> Result<Vec<ItineraryItem>, PlannerError> {
    let value = extract_json(text)
        .ok_or_else(|| PlannerError::Malformed("no JSON itinerary in response".into()))?;
    parse_itinerary(value)
}

/// Parse the text of a revision call.
///
/// Plain text is a conversational answer with no itinerary change. A JSON
/// object with an itinerary key is a replacement; its message key (if any)
/// becomes the transcript text.
pub fn parse_revision_text(text: &str) -> Result<RevisionReply, PlannerError> {
    let plain = || RevisionReply {
        message: text.trim().to_owned(),
        itinerary: None,
    };

    let Some(Value::Object(mut map)) = extract_json(text) else {
        return Ok(plain());
    };

    let message = MESSAGE_KEYS
        .iter()
        .find_map(|k| map.get(*k).and_then(Value::as_str))
        .map(str::to_owned);

    match ITINERARY_KEYS.iter().find_map(|k| map.remove(*k)) {
        Some(Value::Array(items)) => Ok(RevisionReply {
            message: message.unwrap_or_else(|| "Updated your itinerary.".to_owned()),
            itinerary: Some(decode_items(items)?),
        }),
        Some(Value::Null) | None => Ok(match message {
            Some(message) => RevisionReply {
                message,
                itinerary: None,
            },
            None => plain(),
        }),
        Some(_) => Err(PlannerError::Malformed(
            "revision itinerary is not an array".into(),
        )),
    }
}

/// Parse a location suggestion list: a JSON array of strings, capped at
/// `limit` and with blanks removed.
pub fn parse_suggestions(text: &str, limit: usize) -> Result<Vec<String>, PlannerError> {
    match extract_json(text) {
        Some(Value::Array(values)) => Ok(values
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .take(limit)
            .map(str::to_owned)
            .collect()),
        _ => Err(PlannerError::Malformed("expected a JSON array of places".into())),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::itinerary::{Category, DayTag};

    #[test]
    fn strips_fences_with_info_string() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("  [1]  "), "[1]");
        assert_eq!(strip_code_fences("```\n{}\n```\n"), "{}");
    }

    #[test]
    fn extracts_json_from_prose() {
        let text = "Here you go!\n[{\"a\": 1}]\nEnjoy.";
        assert_eq!(extract_json(text), Some(json!([{ "a": 1 }])));
        assert_eq!(extract_json("no json here"), None);
    }

    #[test]
    fn object_after_prose_wins_over_its_inner_array() {
        let text = "Here you go: {\"message\":\"ok\",\"itinerary\":[]} enjoy";
        assert_eq!(
            extract_json(text),
            Some(json!({ "message": "ok", "itinerary": [] }))
        );
    }

    #[test]
    fn revision_fenced_object_after_prose() {
        let text = "Sure! I moved lunch earlier.\n```json\n{\"message\":\"Moved lunch.\",\"itinerary\":[{\"time\":\"11:30 AM\",\"title\":\"Lunch\",\"category\":\"meal\",\"day\":1}]}\n```\nLet me know!";
        let reply = parse_revision_text(text).unwrap();
        assert_eq!(reply.message, "Moved lunch.");
        let items = reply.itinerary.expect("replacement itinerary");
        assert_eq!(items[0].title, "Lunch");
    }

    #[test]
    fn revision_bare_object_after_prose() {
        let text = "Done, here is the new plan: {\"message\":\"Added a nap.\",\"itinerary\":[{\"time\":\"1 PM\",\"title\":\"Nap\",\"category\":\"nap\"}]}";
        let reply = parse_revision_text(text).unwrap();
        assert_eq!(reply.message, "Added a nap.");
        assert_eq!(reply.itinerary.expect("replacement itinerary").len(), 1);
    }

    #[test]
    fn generation_accepts_array_or_wrapped_array() {
        let bare = r#"[{"time":"9:00 AM","title":"Beach","category":"activity","day":1}]"#;
        let items = parse_generation_text(bare).unwrap();
        assert_eq!(items[0].category, Category::Activity);
        assert_eq!(items[0].day, Some(DayTag::Number(1)));

        let wrapped = r#"```json
{"itinerary":[{"time":"noon","title":"Tacos","category":"meal"}]}
```"#;
        assert_eq!(parse_generation_text(wrapped).unwrap().len(), 1);
    }

    #[test]
    fn generation_rejects_non_arrays() {
        assert!(matches!(
            parse_generation_text(r#"{"plan": "beach day"}"#),
            Err(PlannerError::Malformed(_))
        ));
        assert!(matches!(
            parse_generation_text("sorry, I can't"),
            Err(PlannerError::Malformed(_))
        ));
    }

    #[test]
    fn generation_reports_bad_item_index() {
        let text = r#"[{"time":"9","title":"ok","category":"nap"},{"title":"broken"}]"#;
        match parse_generation_text(text) {
            Err(PlannerError::Malformed(msg)) => assert!(msg.contains("item 1"), "{msg}"),
            other => panic!("expected malformed error, got {other:?}"),
        }
    }

    #[test]
    fn revision_plain_text_has_no_itinerary() {
        let reply = parse_revision_text("  Sure, the aquarium opens at 10.  ").unwrap();
        assert_eq!(reply.message, "Sure, the aquarium opens at 10.");
        assert!(reply.itinerary.is_none());
    }

    #[test]
    fn revision_with_replacement() {
        let text = r#"{"message":"Moved lunch earlier.","itinerary":[{"time":"11:30 AM","title":"Lunch","category":"meal","day":1}]}"#;
        let reply = parse_revision_text(text).unwrap();
        assert_eq!(reply.message, "Moved lunch earlier.");
        assert_eq!(reply.itinerary.unwrap()[0].title, "Lunch");
    }

    #[test]
    fn revision_json_without_itinerary_is_message_only() {
        let reply = parse_revision_text(r#"{"reply":"No changes needed.","itinerary":null}"#).unwrap();
        assert_eq!(reply.message, "No changes needed.");
        assert!(reply.itinerary.is_none());
    }

    #[test]
    fn revision_with_non_array_itinerary_is_malformed() {
        assert!(parse_revision_text(r#"{"itinerary":"see above"}"#).is_err());
    }

    #[test]
    fn suggestions_are_trimmed_and_capped() {
        let text = r#"["San Diego, CA", " ", "Santa Cruz, CA", "Sausalito, CA"]"#;
        assert_eq!(
            parse_suggestions(text, 2).unwrap(),
            vec!["San Diego, CA", "Santa Cruz, CA"]
        );
        assert!(parse_suggestions("{}", 5).is_err());
    }
}
