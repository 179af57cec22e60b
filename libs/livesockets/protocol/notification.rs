use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Severity/category of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

impl Default for NotificationKind {
    fn default() -> Self {
        NotificationKind::Info
    }
}

/// Payload accepted by the external notification sink
///
/// Extra options beyond `type`/`title`/`message` are carried through
/// untouched so server-pushed payloads arrive at the sink verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            options: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_with_extra_options() {
        let payload = r#"{
            "type": "success",
            "title": "Deployed",
            "message": "Your app is live",
            "duration": 5000,
            "actionUrl": "https://app-3.appforge.dev"
        }"#;

        let notification: Notification = serde_json::from_str(payload).unwrap();
        assert_eq!(notification.kind, NotificationKind::Success);
        assert_eq!(notification.title, "Deployed");
        assert_eq!(notification.options["duration"], json!(5000));
        assert_eq!(
            notification.options["actionUrl"],
            json!("https://app-3.appforge.dev")
        );
    }

    #[test]
    fn test_kind_defaults_to_info() {
        let payload = r#"{"title": "Heads up"}"#;
        let notification: Notification = serde_json::from_str(payload).unwrap();
        assert_eq!(notification.kind, NotificationKind::Info);
        assert_eq!(notification.message, "");
    }

    #[test]
    fn test_options_survive_round_trip() {
        let mut notification =
            Notification::new(NotificationKind::Warning, "Quota", "Almost out of builds");
        notification
            .options
            .insert("remaining".to_string(), json!(2));

        let encoded = serde_json::to_string(&notification).unwrap();
        let decoded: Notification = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, notification);
    }
}
