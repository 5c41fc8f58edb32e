//! Server configuration tests.

use crate::{ConfigValidationError, ServerConfig};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any absolute prefix with a positive body limit validates
    #[test]
    fn prop_absolute_paths_accepted(
        segments in prop::collection::vec("[a-z][a-z0-9_-]{0,8}", 0..4),
        max_body_size in 1usize..10_000_000,
    ) {
        let api_path = format!("/{}", segments.join("/"));
        let config = ServerConfig::new()
            .with_api_path(api_path.clone())
            .with_max_body_size(max_body_size);
        prop_assert!(config.validate().is_ok(), "'{}' should be accepted", api_path);
    }

    /// Relative prefixes are rejected
    #[test]
    fn prop_relative_paths_rejected(api_path in "[a-z][a-z0-9/]{0,12}") {
        let config = ServerConfig::new().with_api_path(api_path.clone());
        prop_assert_eq!(
            config.validate(),
            Err(ConfigValidationError::InvalidApiPath(api_path))
        );
    }

    /// The normalized prefix always ends with exactly one added slash
    #[test]
    fn prop_normalized_path_ends_with_slash(api_path in "/[a-z]{0,10}/?") {
        let normalized = ServerConfig::new().with_api_path(api_path.clone()).normalized_api_path();
        prop_assert!(normalized.ends_with('/'));
        prop_assert!(normalized.starts_with(&api_path));
        prop_assert!(normalized.len() <= api_path.len() + 1);
    }
}

#[test]
fn test_defaults() {
    let config = ServerConfig::default();
    assert_eq!(config.api_path, "/api/");
    assert_eq!(config.max_body_size, 1024 * 1024);
    assert!(!config.mirror_error_status);
    assert!(!config.expose_internal_errors);
    assert!(config.validate().is_ok());
}

#[test]
fn test_zero_body_size_rejected() {
    let config = ServerConfig::new().with_max_body_size(0);
    assert_eq!(config.validate(), Err(ConfigValidationError::InvalidMaxBodySize));
}

#[test]
fn test_error_messages() {
    assert_eq!(
        ConfigValidationError::InvalidApiPath("api".into()).to_string(),
        "api_path must start with '/', got 'api'"
    );
    assert_eq!(
        ConfigValidationError::InvalidMaxBodySize.to_string(),
        "max_body_size must be greater than 0"
    );
}

#[test]
fn test_partial_config_deserializes_with_defaults() {
    let config: ServerConfig =
        serde_json::from_str(r#"{"api_path": "/rpc", "mirror_error_status": true}"#).unwrap();
    assert_eq!(config.api_path, "/rpc");
    assert_eq!(config.normalized_api_path(), "/rpc/");
    assert!(config.mirror_error_status);
    assert_eq!(config.max_body_size, ServerConfig::default().max_body_size);
}
