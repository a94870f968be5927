//! Property-based tests for configuration module
//!
//! These tests use proptest to generate configurations and argument lists
//! and check the socket-name resolution and serialization invariants.

use super::*;
use proptest::prelude::*;

fn orientation() -> impl Strategy<Value = ScreenOrientation> {
    prop_oneof![
        Just(ScreenOrientation::Primary),
        Just(ScreenOrientation::Landscape),
        Just(ScreenOrientation::Portrait),
        Just(ScreenOrientation::InvertedLandscape),
        Just(ScreenOrientation::InvertedPortrait),
    ]
}

// Output values are never validated, so the full i32 range is fair game
prop_compose! {
    fn any_output_config()(
        x in any::<i32>(),
        y in any::<i32>(),
        width in any::<i32>(),
        height in any::<i32>(),
        refresh_rate in any::<i32>(),
        orientation in orientation(),
    ) -> OutputConfig {
        OutputConfig { x, y, width, height, refresh_rate, orientation }
    }
}

prop_compose! {
    fn socket_name()(name in "[a-z][a-z0-9-]{0,15}") -> String {
        name
    }
}

proptest! {
    #[test]
    fn test_any_output_config_validates(output in any_output_config()) {
        let config = SessionConfig { output, ..SessionConfig::default() };
        prop_assert!(config.validate().is_ok());
    }

    #[test]
    fn test_output_config_roundtrip(output in any_output_config()) {
        let config = SessionConfig { output, ..SessionConfig::default() };
        let text = toml::to_string(&config).unwrap();
        let parsed: SessionConfig = toml::from_str(&text).unwrap();
        prop_assert_eq!(parsed, config);
    }

    #[test]
    fn test_override_always_wins(
        explicit in proptest::option::of(socket_name()),
        override_name in socket_name(),
        prefix in proptest::collection::vec("[a-z]{1,6}", 0..4),
    ) {
        let mut args = prefix;
        args.push(SOCKET_NAME_FLAG.to_string());
        args.push(override_name.clone());

        prop_assert_eq!(resolve_socket_name(explicit.as_deref(), &args), Some(override_name));
    }

    #[test]
    fn test_without_flag_explicit_is_kept(
        explicit in proptest::option::of(socket_name()),
        args in proptest::collection::vec("[a-z]{1,6}", 0..6),
    ) {
        prop_assert_eq!(resolve_socket_name(explicit.as_deref(), &args), explicit);
    }
}
