//! Property-based tests for rust_channel_logger using proptest

use proptest::prelude::*;
use rust_channel_logger::config::environment::expand_env;
use rust_channel_logger::prelude::*;
use rust_channel_logger::resolver::{prefix_log_path, resolve};
use rust_channel_logger::ParamValue;
use std::collections::HashMap;
use std::path::Path;

fn severity() -> impl Strategy<Value = Severity> {
    prop::sample::select(Severity::ALL.to_vec())
}

// ============================================================================
// Severity Tests
// ============================================================================

proptest! {
    /// Severity names roundtrip through parsing
    #[test]
    fn test_severity_str_roundtrip(level in severity()) {
        let parsed: Severity = level.as_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
        let upper: Severity = level.level_name().parse().unwrap();
        prop_assert_eq!(level, upper);
    }

    /// Ordering agrees with the numeric value and inverts the syslog code
    #[test]
    fn test_severity_ordering(a in severity(), b in severity()) {
        prop_assert_eq!(a.cmp(&b), a.value().cmp(&b.value()));
        prop_assert_eq!(a.cmp(&b), b.syslog_code().cmp(&a.syslog_code()));
    }
}

// ============================================================================
// Log File Prefixing Tests
// ============================================================================

proptest! {
    /// Bare file names are placed in the log directory
    #[test]
    fn test_bare_names_are_prefixed(name in "[a-z][a-z0-9_.-]{0,20}") {
        let prefixed = prefix_log_path(Path::new("/var/log/app"), &name);
        prop_assert_eq!(prefixed, format!("/var/log/app/{}", name));
    }

    /// Anything containing a separator passes through unchanged
    #[test]
    fn test_paths_pass_through(dir in "[a-z]{1,8}", name in "[a-z]{1,8}\\.log") {
        let relative = format!("{}/{}", dir, name);
        let absolute = format!("/{}", relative);
        let log_path = Path::new("/var/log/app");
        prop_assert_eq!(prefix_log_path(log_path, &relative), relative.clone());
        prop_assert_eq!(prefix_log_path(log_path, &absolute), absolute.clone());
    }
}

// ============================================================================
// Resolution Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Resolving the same channel twice yields identical arguments in the
    /// handler's declaration order
    #[test]
    fn test_resolve_is_deterministic(
        file in "[a-z]{1,10}\\.log",
        max_files in 0i64..30,
        level in severity(),
    ) {
        let dir = tempfile::TempDir::new().unwrap();
        let overrides = ChannelOverrides::new().with_channel(
            "prop",
            RawChannel::new("rotating_file")
                .with_param("filename", file.as_str())
                .with_param("maxFiles", max_files)
                .with_param("level", level),
        );
        let config = ConfigLoader::new()
            .root(dir.path())
            .env(HashMap::<String, String>::new())
            .load(&overrides)
            .unwrap();

        let first = resolve("prop", &config).unwrap();
        let second = resolve("prop", &config).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(
            first.names(),
            vec!["filename", "max_files", "level", "bubble", "file_permission", "use_locking", "compress"]
        );
        prop_assert_eq!(first.get("max_files"), Some(&ParamValue::Int(max_files)));
        let expected_file = config.log_path.join(&file).display().to_string();
        prop_assert_eq!(first.get("filename"), Some(&ParamValue::String(expected_file)));
    }

    /// Unknown channels never resolve
    #[test]
    fn test_unknown_channels_fail(name in "zz_[a-z]{1,10}") {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ConfigLoader::new()
            .root(dir.path())
            .env(HashMap::<String, String>::new())
            .load(&ChannelOverrides::new())
            .unwrap();

        let err = resolve(&name, &config).unwrap_err();
        prop_assert!(err.is_resolver());
    }
}

// ============================================================================
// Environment Interpolation Tests
// ============================================================================

proptest! {
    /// Set variables are substituted, unset ones take the default
    #[test]
    fn test_env_expansion(value in "[a-zA-Z0-9 ]{1,20}", default in "[a-z]{0,10}") {
        let env: HashMap<String, String> =
            [("PROP_SET".to_string(), value.clone())].into_iter().collect();

        prop_assert_eq!(expand_env("${PROP_SET}", &env), value.clone());
        prop_assert_eq!(expand_env(&format!("${{PROP_SET:-{}}}", default), &env), value);
        prop_assert_eq!(expand_env(&format!("${{PROP_UNSET:-{}}}", default), &env), default);
    }

    /// Text without references is returned unchanged
    #[test]
    fn test_plain_text_is_untouched(text in "[a-zA-Z0-9 /._-]{0,40}") {
        let env = HashMap::<String, String>::new();
        prop_assert_eq!(expand_env(&text, &env), text);
    }
}

// ============================================================================
// Context Merge Tests
// ============================================================================

proptest! {
    /// Merged contexts never contain falsy values, and call keys win
    #[test]
    fn test_merge_filters_and_overrides(
        base in prop::collection::btree_map("[a-c]", 0i64..3, 0..4),
        call in prop::collection::btree_map("[a-c]", 0i64..3, 0..4),
    ) {
        let base_ctx: LogContext = base.clone().into_iter().collect();
        let call_ctx: LogContext = call.clone().into_iter().collect();

        let merged = LogContext::merged(&base_ctx, &call_ctx);

        for (key, value) in merged.fields() {
            prop_assert!(!value.is_falsy());
            let expected = call.get(key).or_else(|| base.get(key)).copied().unwrap();
            prop_assert_eq!(value, &FieldValue::Int(expected));
        }
    }
}
