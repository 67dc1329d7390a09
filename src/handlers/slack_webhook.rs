//! Slack incoming-webhook handler

use crate::core::severity::Severity;
use crate::resolver::parameters::{ParamDefault, ParamType, Parameter};

/// Declared parameters of the Slack webhook handler
pub const SLACK_WEBHOOK_PARAMETERS: &[Parameter] = &[
    Parameter::new("webhook_url", ParamType::Str, ParamDefault::Required),
    Parameter::new("channel", ParamType::OptionalStr, ParamDefault::Null),
    Parameter::new("username", ParamType::OptionalStr, ParamDefault::Null),
    Parameter::new("use_attachment", ParamType::Bool, ParamDefault::Bool(true)),
    Parameter::new("icon_emoji", ParamType::OptionalStr, ParamDefault::Null),
    Parameter::new("use_short_attachment", ParamType::Bool, ParamDefault::Bool(false)),
    Parameter::new("include_context_and_extra", ParamType::Bool, ParamDefault::Bool(false)),
    Parameter::new("level", ParamType::Level, ParamDefault::Level(Severity::Critical)),
    Parameter::new("bubble", ParamType::Bool, ParamDefault::Bool(true)),
    Parameter::new("exclude_fields", ParamType::List, ParamDefault::EmptyList),
];

/// Attachment color for a severity
pub fn attachment_color(level: Severity) -> &'static str {
    if level >= Severity::Error {
        "danger"
    } else if level >= Severity::Warning {
        "warning"
    } else if level >= Severity::Info {
        "good"
    } else {
        "#e3e4e6"
    }
}

#[cfg(feature = "webhook")]
pub use self::client::SlackWebhookHandler;

#[cfg(feature = "webhook")]
mod client {
    use super::{attachment_color, SLACK_WEBHOOK_PARAMETERS};
    use crate::core::error::{LoggerError, Result};
    use crate::core::handler::{impl_handler_state, FormattableHandler, Handler, HandlerState, ProcessableHandler};
    use crate::core::log_context::LogContext;
    use crate::core::log_record::LogRecord;
    use crate::core::severity::Severity;
    use crate::resolver::arguments::ArgumentCursor;
    use crate::resolver::parameters::Parameter;
    use crate::resolver::registry::FromArguments;
    use reqwest::blocking::Client;
    use reqwest::Url;
    use serde_json::{json, Map, Value};
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    /// Posts records to a Slack incoming webhook.
    ///
    /// Requests are sent synchronously; a non-2xx response is an error.
    pub struct SlackWebhookHandler {
        state: HandlerState,
        url: Url,
        channel: Option<String>,
        username: Option<String>,
        icon_emoji: Option<String>,
        use_attachment: bool,
        use_short_attachment: bool,
        include_context_and_extra: bool,
        exclude_fields: Vec<String>,
        client: Client,
    }

    impl SlackWebhookHandler {
        /// # Errors
        ///
        /// Returns an error if the URL is empty or not an http(s) URL, or
        /// if the HTTP client cannot be created
        pub fn new(webhook_url: &str, level: Severity, bubble: bool) -> Result<Self> {
            if webhook_url.trim().is_empty() {
                return Err(LoggerError::handler("slack_webhook", "webhook_url is required"));
            }
            let url = Url::parse(webhook_url.trim()).map_err(|e| {
                LoggerError::handler("slack_webhook", format!("invalid webhook_url: {}", e))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(LoggerError::handler(
                    "slack_webhook",
                    format!("webhook_url must be http(s), got '{}'", url.scheme()),
                ));
            }

            let client = Client::builder().timeout(TIMEOUT).build().map_err(|e| {
                LoggerError::handler("slack_webhook", format!("failed to build HTTP client: {}", e))
            })?;

            Ok(Self {
                state: HandlerState::new(level, bubble),
                url,
                channel: None,
                username: None,
                icon_emoji: None,
                use_attachment: true,
                use_short_attachment: false,
                include_context_and_extra: false,
                exclude_fields: Vec::new(),
                client,
            })
        }

        #[must_use]
        pub fn with_channel(mut self, channel: Option<String>) -> Self {
            self.channel = channel;
            self
        }

        #[must_use]
        pub fn with_username(mut self, username: Option<String>) -> Self {
            self.username = username;
            self
        }

        #[must_use]
        pub fn with_icon_emoji(mut self, icon: Option<String>) -> Self {
            self.icon_emoji = icon.map(|i| format!(":{}:", i.trim_matches(':')));
            self
        }

        #[must_use]
        pub fn with_attachment(mut self, use_attachment: bool, short: bool) -> Self {
            self.use_attachment = use_attachment;
            self.use_short_attachment = short;
            self
        }

        #[must_use]
        pub fn with_context_and_extra(mut self, include: bool) -> Self {
            self.include_context_and_extra = include;
            self
        }

        /// Fields to drop, written as `context.<key>` or `extra.<key>`
        #[must_use]
        pub fn with_excluded_fields(mut self, fields: Vec<String>) -> Self {
            self.exclude_fields = fields;
            self
        }

        pub fn url(&self) -> &Url {
            &self.url
        }

        fn without_excluded(&self, section: &str, context: &LogContext) -> LogContext {
            let mut context = context.clone();
            for field in &self.exclude_fields {
                if let Some(key) = field
                    .strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('.'))
                {
                    context.remove(key);
                }
            }
            context
        }

        /// Request body for one record
        pub fn payload(&self, record: &LogRecord, formatted: &str) -> Value {
            let mut body = Map::new();
            if let Some(channel) = &self.channel {
                body.insert("channel".into(), json!(channel));
            }
            if let Some(username) = &self.username {
                body.insert("username".into(), json!(username));
            }
            if let Some(icon) = &self.icon_emoji {
                body.insert("icon_emoji".into(), json!(icon));
            }

            if !self.use_attachment {
                body.insert("text".into(), json!(formatted.trim_end()));
                return Value::Object(body);
            }

            let mut fields = Vec::new();
            let mut attachment = Map::new();
            attachment.insert("fallback".into(), json!(record.message));
            attachment.insert("text".into(), json!(record.message));
            attachment.insert("color".into(), json!(attachment_color(record.level)));

            if self.use_short_attachment {
                attachment.insert("title".into(), json!(record.level.level_name()));
            } else {
                attachment.insert("title".into(), json!("Message"));
                fields.push(field("Level", json!(record.level.level_name())));
            }

            if self.include_context_and_extra {
                let sections = [
                    ("extra", self.without_excluded("extra", &record.extra)),
                    ("context", self.without_excluded("context", &record.context)),
                ];
                for (section, values) in sections.iter().filter(|(_, v)| !v.is_empty()) {
                    if self.use_short_attachment {
                        fields.push(field(&capitalize(section), values.to_json_value()));
                    } else {
                        for (key, value) in values.fields() {
                            fields.push(field(&capitalize(key), value.to_json_value()));
                        }
                    }
                }
            }

            attachment.insert("fields".into(), Value::Array(fields));
            attachment.insert("mrkdwn_in".into(), json!(["fields"]));
            attachment.insert("ts".into(), json!(record.datetime.timestamp()));

            body.insert("attachments".into(), json!([attachment]));
            Value::Object(body)
        }
    }

    fn field(title: &str, value: Value) -> Value {
        let value = match value {
            Value::String(s) => s,
            Value::Array(_) | Value::Object(_) => format!(
                "```{}```",
                serde_json::to_string_pretty(&value).unwrap_or_default()
            ),
            other => other.to_string(),
        };
        json!({ "title": title, "value": value, "short": false })
    }

    fn capitalize(s: &str) -> String {
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    impl FromArguments for SlackWebhookHandler {
        const PARAMETERS: &'static [Parameter] = SLACK_WEBHOOK_PARAMETERS;

        fn from_arguments(args: &mut ArgumentCursor<'_>) -> Result<Self> {
            let url = args.next_str("webhook_url")?;
            let channel = args.next_opt_str("channel")?;
            let username = args.next_opt_str("username")?;
            let use_attachment = args.next_bool("use_attachment")?;
            let icon_emoji = args.next_opt_str("icon_emoji")?;
            let use_short_attachment = args.next_bool("use_short_attachment")?;
            let include_context_and_extra = args.next_bool("include_context_and_extra")?;
            let level = args.next_level("level")?;
            let bubble = args.next_bool("bubble")?;
            let exclude_fields = args.next_list("exclude_fields")?;

            Ok(Self::new(&url, level, bubble)?
                .with_channel(channel)
                .with_username(username)
                .with_icon_emoji(icon_emoji)
                .with_attachment(use_attachment, use_short_attachment)
                .with_context_and_extra(include_context_and_extra)
                .with_excluded_fields(exclude_fields))
        }
    }

    impl Handler for SlackWebhookHandler {
        fn name(&self) -> &str {
            "slack_webhook"
        }

        fn is_handling(&self, level: Severity) -> bool {
            self.state.is_handling(level)
        }

        fn handle(&mut self, record: &LogRecord) -> Result<bool> {
            if !self.state.is_handling(record.level) {
                return Ok(false);
            }

            let (record, formatted) = self.state.prepare(record)?;
            let payload = self.payload(&record, &formatted);

            self.client
                .post(self.url.clone())
                .json(&payload)
                .send()
                .and_then(|response| response.error_for_status())
                .map_err(|e| LoggerError::handler("slack_webhook", format!("request failed: {}", e)))?;

            Ok(!self.state.bubble)
        }

        fn as_formattable(&mut self) -> Option<&mut dyn FormattableHandler> {
            Some(self)
        }

        fn as_processable(&mut self) -> Option<&mut dyn ProcessableHandler> {
            Some(self)
        }
    }

    impl_handler_state!(SlackWebhookHandler);

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::core::log_record::test_record;

        fn handler() -> SlackWebhookHandler {
            SlackWebhookHandler::new("https://hooks.slack.com/services/T0/B0/XYZ", Severity::Critical, true)
                .unwrap()
        }

        #[test]
        fn test_url_validation() {
            assert!(SlackWebhookHandler::new("", Severity::Critical, true).is_err());
            assert!(SlackWebhookHandler::new("not a url", Severity::Critical, true).is_err());
            assert!(SlackWebhookHandler::new("ftp://example.com/hook", Severity::Critical, true).is_err());
        }

        #[test]
        fn test_attachment_payload() {
            let handler = handler()
                .with_channel(Some("#alerts".into()))
                .with_icon_emoji(Some("fire".into()));
            let record = test_record(Severity::Critical, "database down");

            let payload = handler.payload(&record, "ignored");

            assert_eq!(payload["channel"], "#alerts");
            assert_eq!(payload["icon_emoji"], ":fire:");
            let attachment = &payload["attachments"][0];
            assert_eq!(attachment["text"], "database down");
            assert_eq!(attachment["color"], "danger");
            assert_eq!(attachment["title"], "Message");
            assert_eq!(attachment["fields"][0]["title"], "Level");
            assert_eq!(attachment["fields"][0]["value"], "CRITICAL");
        }

        #[test]
        fn test_plain_text_payload() {
            let handler = handler().with_attachment(false, false);
            let payload = handler.payload(&test_record(Severity::Alert, "x"), "formatted line\n");
            assert_eq!(payload["text"], "formatted line");
            assert!(payload.get("attachments").is_none());
        }

        #[test]
        fn test_context_fields_with_exclusions() {
            let handler = handler()
                .with_context_and_extra(true)
                .with_excluded_fields(vec!["context.password".into()]);
            let record = test_record(Severity::Critical, "login").with_context(
                LogContext::new()
                    .with_field("user", "ada")
                    .with_field("password", "hunter2"),
            );

            let payload = handler.payload(&record, "");
            let fields = payload["attachments"][0]["fields"].as_array().unwrap();
            let titles: Vec<_> = fields.iter().map(|f| f["title"].as_str().unwrap()).collect();

            assert_eq!(titles, vec!["Level", "User"]);
        }

        #[test]
        fn test_short_attachment() {
            let handler = handler().with_attachment(true, true);
            let payload = handler.payload(&test_record(Severity::Warning, "slow"), "");
            let attachment = &payload["attachments"][0];
            assert_eq!(attachment["title"], "WARNING");
            assert_eq!(attachment["color"], "warning");
            assert!(attachment["fields"].as_array().unwrap().is_empty());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_colors() {
        assert_eq!(attachment_color(Severity::Emergency), "danger");
        assert_eq!(attachment_color(Severity::Warning), "warning");
        assert_eq!(attachment_color(Severity::Notice), "good");
        assert_eq!(attachment_color(Severity::Debug), "#e3e4e6");
    }
}
