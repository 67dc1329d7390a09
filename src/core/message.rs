//! Messages accepted by the logger facade

use super::error::Result;

/// A log message: plain text, or a structured value that is JSON-encoded
/// before it reaches the channel loggers.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Text(String),
    Structured(serde_json::Value),
}

impl Message {
    /// Serialize the message into the string handed to every channel
    pub fn encode(&self) -> Result<String> {
        match self {
            Message::Text(text) => Ok(text.clone()),
            Message::Structured(serde_json::Value::String(text)) => Ok(text.clone()),
            Message::Structured(value) => Ok(serde_json::to_string(value)?),
        }
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Message::Text(s.to_string())
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Message::Text(s)
    }
}

impl From<&String> for Message {
    fn from(s: &String) -> Self {
        Message::Text(s.clone())
    }
}

impl From<serde_json::Value> for Message {
    fn from(value: serde_json::Value) -> Self {
        Message::Structured(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_is_not_encoded() {
        let message = Message::from("just an info {key}");
        assert_eq!(message.encode().unwrap(), "just an info {key}");
    }

    #[test]
    fn test_structured_message_is_json_encoded() {
        let message = Message::from(json!({"key1": "value1", "key2": "value2"}));
        assert_eq!(
            message.encode().unwrap(),
            r#"{"key1":"value1","key2":"value2"}"#
        );
    }

    #[test]
    fn test_json_string_stays_plain() {
        assert_eq!(Message::from(json!("plain")).encode().unwrap(), "plain");
    }
}
