//! Handler construction from resolved arguments

use super::arguments::ResolvedArguments;
use super::registry::HandlerSpec;
use crate::config::channel::GlobalConfig;
use crate::core::error::{LoggerError, Result};
use crate::core::handler::Handler;

/// Build a fresh handler for `channel`.
///
/// The arguments must come from [`resolve`](super::arguments::resolve) for
/// the same channel. A formatter is attached when the handler accepts one,
/// and likewise a processor.
pub fn build(
    channel: &str,
    config: &GlobalConfig,
    arguments: &ResolvedArguments,
) -> Result<Box<dyn Handler>> {
    let kind = match arguments.handler() {
        Some(kind) if !arguments.is_empty() => kind,
        _ => {
            return Err(LoggerError::resolver(
                channel,
                "Can not create handler instance, resolve the channel before building",
            ))
        }
    };
    let descriptor = config.channel(channel).ok_or_else(|| {
        LoggerError::resolver(
            channel,
            format!("Configuration for channel \"{}\" not found", channel),
        )
    })?;
    if descriptor.handler != kind {
        return Err(LoggerError::resolver(
            channel,
            format!(
                "arguments were resolved for handler '{}', channel uses '{}'",
                kind, descriptor.handler
            ),
        ));
    }

    let spec = HandlerSpec::for_kind(kind);
    let mut cursor = arguments.cursor();
    let mut handler = (spec.construct)(&mut cursor)
        .and_then(|handler| cursor.finish().map(|_| handler))
        .map_err(|e| LoggerError::resolver(channel, e.to_string()))?;

    if let Some(formattable) = handler.as_formattable() {
        formattable.set_formatter(descriptor.formatter.instantiate(&config.date_format));
    }
    if let Some(processable) = handler.as_processable() {
        processable.push_processor(descriptor.processor.instantiate());
    }

    tracing::debug!(
        channel,
        handler = %kind,
        formatter = %descriptor.formatter,
        processor = %descriptor.processor,
        "handler built"
    );

    Ok(handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::channel::{ChannelDescriptor, ParamValue};
    use crate::core::formatter::FormatterKind;
    use crate::core::processor::ProcessorKind;
    use crate::core::severity::Severity;
    use crate::core::timezone::Timezone;
    use crate::handlers::HandlerKind;
    use crate::resolver::arguments::resolve;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn config(dir: &TempDir, channels: Vec<(&str, HandlerKind, Vec<(&str, ParamValue)>)>) -> GlobalConfig {
        let channels = channels
            .into_iter()
            .map(|(name, handler, params)| {
                let mut parameters: BTreeMap<String, ParamValue> = params
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect();
                parameters
                    .entry("level".to_string())
                    .or_insert_with(|| ParamValue::from(Severity::Debug));
                let descriptor = ChannelDescriptor {
                    name: name.to_string(),
                    handler,
                    formatter: FormatterKind::Json,
                    processor: ProcessorKind::Uid,
                    level: Severity::Debug,
                    parameters,
                };
                (name.to_string(), descriptor)
            })
            .collect();

        GlobalConfig {
            log_file: dir.path().join("log"),
            log_path: dir.path().to_path_buf(),
            timezone: Timezone::Utc,
            date_format: "%Y-%m-%d".to_string(),
            channels,
        }
    }

    #[test]
    fn test_build_requires_resolved_arguments() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, vec![("main", HandlerKind::Null, vec![])]);

        let err = build("main", &config, &ResolvedArguments::default()).err().unwrap();
        assert!(err.is_resolver());
        assert!(err.to_string().contains("resolve the channel before building"));
    }

    #[test]
    fn test_build_attaches_formatter_and_processor() {
        let dir = TempDir::new().unwrap();
        let config = config(
            &dir,
            vec![("main", HandlerKind::Stream, vec![("stream", "app.log".into())])],
        );

        let arguments = resolve("main", &config).unwrap();
        let mut handler = build("main", &config, &arguments).unwrap();

        assert_eq!(handler.name(), "stream");
        let processable = handler.as_processable().unwrap();
        assert_eq!(processable.processor_count(), 1);
    }

    #[test]
    fn test_every_build_is_a_new_instance() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, vec![("main", HandlerKind::ErrorLog, vec![])]);
        let arguments = resolve("main", &config).unwrap();

        let mut first = build("main", &config, &arguments).unwrap();
        let mut second = build("main", &config, &arguments).unwrap();
        first.as_processable().unwrap().push_processor(ProcessorKind::Uid.instantiate());

        assert_eq!(first.as_processable().unwrap().processor_count(), 2);
        assert_eq!(second.as_processable().unwrap().processor_count(), 1);
    }

    #[test]
    fn test_null_handler_is_not_formattable() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, vec![("null", HandlerKind::Null, vec![])]);
        let arguments = resolve("null", &config).unwrap();

        let mut handler = build("null", &config, &arguments).unwrap();
        assert!(handler.as_formattable().is_none());
        assert!(handler.as_processable().is_none());
    }

    #[test]
    fn test_constructor_failure_becomes_resolver_error() {
        let dir = TempDir::new().unwrap();
        let config = config(
            &dir,
            vec![("remote", HandlerKind::SyslogUdp, vec![("port", ParamValue::Int(70000))])],
        );
        let arguments = resolve("remote", &config).unwrap();

        let err = build("remote", &config, &arguments).err().unwrap();
        assert!(err.is_resolver());
    }

    #[test]
    fn test_type_mismatch_becomes_resolver_error() {
        let dir = TempDir::new().unwrap();
        let config = config(
            &dir,
            vec![(
                "main",
                HandlerKind::Stream,
                vec![("stream", "app.log".into()), ("use_locking", ParamValue::Float(1.5))],
            )],
        );
        let arguments = resolve("main", &config).unwrap();

        let err = build("main", &config, &arguments).err().unwrap();
        assert!(err.is_resolver());
        assert!(err.to_string().contains("use_locking"));
    }
}
