//! Event normalization
//!
//! Converts one raw action envelope into zero or one [`ChatEvent`]. Tracking
//! keys are stripped first, then the envelope is classified at a single
//! dispatch point. Only `addChatItemAction` carrying a
//! `liveChatTextMessageRenderer` yields an event; everything else is a
//! skip, reported as a value rather than an error so one bad event can
//! never abort a batch.

use serde_json::Value;

use crate::types::ChatEvent;

/// The one action kind that produces events
pub const SUPPORTED_ACTION: &str = "addChatItemAction";

/// The one item renderer that produces events
pub const TEXT_MESSAGE_RENDERER: &str = "liveChatTextMessageRenderer";

/// Action kinds the source emits that we recognize but do not record
const UNIMPLEMENTED_ACTIONS: [&str; 3] = [
    "addLiveChatTickerItemAction",
    "removeChatItemByAuthorAction",
    "replaceChatItemAction",
];

/// Recursively remove every map key whose lowercase form contains
/// "tracking", at any depth, in maps and arrays alike. Scalars pass
/// through. Runs before kind dispatch so telemetry identifiers are never
/// forwarded or persisted.
pub fn strip_tracking(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| !key.to_lowercase().contains("tracking"))
                .map(|(key, inner)| (key, strip_tracking(inner)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_tracking).collect()),
        scalar => scalar,
    }
}

/// A raw action envelope after classification.
///
/// The envelope is a map keyed by action-kind name; this is the single
/// place that inspects those keys.
#[derive(Debug, Clone)]
pub enum RawAction {
    /// The supported kind, with its payload
    AddChatItem(Value),
    /// A recognized kind we deliberately do not record; carries only the
    /// kind name for diagnostics
    Unimplemented(String),
    /// Anything else, dropped without diagnostics
    Unknown,
}

impl RawAction {
    /// Classify one envelope by its kind tag.
    pub fn classify(envelope: &Value) -> Self {
        let Some(map) = envelope.as_object() else {
            return Self::Unknown;
        };

        if let Some(payload) = map.get(SUPPORTED_ACTION) {
            return Self::AddChatItem(payload.clone());
        }

        for kind in UNIMPLEMENTED_ACTIONS {
            if map.contains_key(kind) {
                return Self::Unimplemented(kind.to_string());
            }
        }

        Self::Unknown
    }
}

/// Why a raw action produced no event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Recognized kind without an implementation (ticker, moderation, ...)
    Unimplemented { kind: String },
    /// Unrecognized kind
    Unknown,
    /// Supported kind with a required field missing or unusable
    Malformed { detail: String },
}

/// Per-event normalization outcome
#[derive(Debug, Clone)]
pub enum Normalized {
    Event(ChatEvent),
    Skipped(SkipReason),
}

/// Normalize one raw action envelope.
pub fn normalize_action(envelope: Value) -> Normalized {
    let envelope = strip_tracking(envelope);

    match RawAction::classify(&envelope) {
        RawAction::AddChatItem(payload) => {
            let renderer = payload
                .get("item")
                .and_then(|item| item.get(TEXT_MESSAGE_RENDERER));

            match renderer {
                Some(renderer) => match extract_event(renderer) {
                    Ok(event) => Normalized::Event(event),
                    Err(detail) => Normalized::Skipped(SkipReason::Malformed { detail }),
                },
                // A chat item that is not a plain text message (membership,
                // paid message, ...); named for diagnostics, not recorded.
                None => Normalized::Skipped(SkipReason::Unimplemented {
                    kind: item_kind(&payload),
                }),
            }
        }
        RawAction::Unimplemented(kind) => Normalized::Skipped(SkipReason::Unimplemented { kind }),
        RawAction::Unknown => Normalized::Skipped(SkipReason::Unknown),
    }
}

fn item_kind(payload: &Value) -> String {
    payload
        .get("item")
        .and_then(Value::as_object)
        .and_then(|item| item.keys().next())
        .cloned()
        .unwrap_or_else(|| SUPPORTED_ACTION.to_string())
}

fn extract_event(renderer: &Value) -> Result<ChatEvent, String> {
    let id = require_text(renderer, "id")?;
    let author_channel_id = require_text(renderer, "authorExternalChannelId")?;
    let author_name = require_text(renderer, "authorName")?;

    let author_badges = renderer
        .get("authorBadges")
        .cloned()
        .ok_or("missing authorBadges")?;

    let author_photo_url = renderer
        .get("authorPhoto")
        .ok_or("missing authorPhoto")
        .map(photo_url)?
        .ok_or("authorPhoto has no usable url")?;

    let message_text = renderer
        .pointer("/message/simpleText")
        .and_then(Value::as_str)
        .ok_or("missing message.simpleText")?
        .to_string();

    let timestamp_micros = renderer
        .get("timestampUsec")
        .ok_or("missing timestampUsec")
        .map(micros_of)?
        .ok_or("timestampUsec is not a microsecond count")?;

    Ok(ChatEvent {
        id,
        timestamp_micros,
        author_channel_id,
        author_name,
        author_badges,
        author_photo_url,
        message_text,
    })
}

/// Accept either a bare string or the `{"simpleText": ...}` wrapper the
/// wire format uses interchangeably.
fn require_text(renderer: &Value, field: &str) -> Result<String, String> {
    let value = renderer
        .get(field)
        .ok_or_else(|| format!("missing {field}"))?;

    value
        .as_str()
        .or_else(|| value.get("simpleText").and_then(Value::as_str))
        .map(str::to_string)
        .ok_or_else(|| format!("{field} is not text"))
}

/// Photo fields arrive as a thumbnail list; take the largest (last) entry.
fn photo_url(value: &Value) -> Option<String> {
    if let Some(url) = value.as_str() {
        return Some(url.to_string());
    }

    value
        .get("thumbnails")?
        .as_array()?
        .last()?
        .get("url")?
        .as_str()
        .map(str::to_string)
}

/// The wire carries timestamps as decimal strings; tolerate bare numbers.
fn micros_of(value: &Value) -> Option<u64> {
    match value {
        Value::String(text) => text.parse().ok(),
        Value::Number(number) => number.as_u64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_message_action() -> Value {
        json!({
            "addChatItemAction": {
                "item": {
                    "liveChatTextMessageRenderer": {
                        "id": "msg-1",
                        "timestampUsec": "1700000000000000",
                        "authorExternalChannelId": "UCchannel",
                        "authorName": { "simpleText": "viewer" },
                        "authorBadges": [],
                        "authorPhoto": {
                            "thumbnails": [
                                { "url": "https://img.example/s32.jpg", "width": 32 },
                                { "url": "https://img.example/s64.jpg", "width": 64 }
                            ]
                        },
                        "message": { "simpleText": "hello chat" },
                        "trackingParams": "CAESAhAB"
                    }
                },
                "clientId": "client-1"
            }
        })
    }

    #[test]
    fn strips_tracking_keys_at_every_depth() {
        let value = json!({
            "trackingParams": "top",
            "keep": {
                "clickTrackingParams": "nested",
                "list": [
                    { "TRACKING": 1, "ok": 2 },
                    "scalar"
                ]
            }
        });

        let stripped = strip_tracking(value);

        assert_eq!(
            stripped,
            json!({ "keep": { "list": [ { "ok": 2 }, "scalar" ] } })
        );
    }

    #[test]
    fn stripping_passes_scalars_through() {
        assert_eq!(strip_tracking(json!(42)), json!(42));
        assert_eq!(strip_tracking(json!("tracking")), json!("tracking"));
        assert_eq!(strip_tracking(Value::Null), Value::Null);
    }

    #[test]
    fn text_message_normalizes() {
        let Normalized::Event(event) = normalize_action(text_message_action()) else {
            panic!("expected an event");
        };

        assert_eq!(event.id, "msg-1");
        assert_eq!(event.timestamp_micros, 1_700_000_000_000_000);
        assert_eq!(event.author_channel_id, "UCchannel");
        assert_eq!(event.author_name, "viewer");
        assert_eq!(event.author_photo_url, "https://img.example/s64.jpg");
        assert_eq!(event.message_text, "hello chat");
    }

    #[test]
    fn normalization_is_idempotent() {
        let first = normalize_action(text_message_action());
        let second = normalize_action(text_message_action());

        match (first, second) {
            (Normalized::Event(a), Normalized::Event(b)) => assert_eq!(a, b),
            _ => panic!("expected events"),
        }
    }

    #[test]
    fn normalized_event_carries_no_tracking_fields() {
        let Normalized::Event(event) = normalize_action(text_message_action()) else {
            panic!("expected an event");
        };

        let raw = serde_json::to_string(&event).unwrap();
        assert!(!raw.to_lowercase().contains("tracking"));
    }

    #[test]
    fn ticker_action_is_unimplemented() {
        let action = json!({ "addLiveChatTickerItemAction": { "item": {} } });

        match normalize_action(action) {
            Normalized::Skipped(SkipReason::Unimplemented { kind }) => {
                assert_eq!(kind, "addLiveChatTickerItemAction");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn unsupported_renderer_is_unimplemented_with_its_kind() {
        let action = json!({
            "addChatItemAction": {
                "item": { "liveChatPaidMessageRenderer": { "id": "x" } }
            }
        });

        match normalize_action(action) {
            Normalized::Skipped(SkipReason::Unimplemented { kind }) => {
                assert_eq!(kind, "liveChatPaidMessageRenderer");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_is_dropped_silently() {
        let action = json!({ "someFutureAction": {} });

        assert!(matches!(
            normalize_action(action),
            Normalized::Skipped(SkipReason::Unknown)
        ));
    }

    #[test]
    fn missing_required_field_is_malformed_not_fatal() {
        let mut action = text_message_action();
        action["addChatItemAction"]["item"]["liveChatTextMessageRenderer"]
            .as_object_mut()
            .unwrap()
            .remove("authorName");

        match normalize_action(action) {
            Normalized::Skipped(SkipReason::Malformed { detail }) => {
                assert!(detail.contains("authorName"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn message_without_simple_text_is_malformed() {
        let mut action = text_message_action();
        action["addChatItemAction"]["item"]["liveChatTextMessageRenderer"]["message"] =
            json!({ "runs": [{ "text": "emoji only" }] });

        assert!(matches!(
            normalize_action(action),
            Normalized::Skipped(SkipReason::Malformed { .. })
        ));
    }

    #[test]
    fn numeric_timestamp_is_accepted() {
        let mut action = text_message_action();
        action["addChatItemAction"]["item"]["liveChatTextMessageRenderer"]["timestampUsec"] =
            json!(1_700_000_000_000_001u64);

        let Normalized::Event(event) = normalize_action(action) else {
            panic!("expected an event");
        };
        assert_eq!(event.timestamp_micros, 1_700_000_000_000_001);
    }
}
