//! Validation rules and route key checks.

use crate::validation::validate_route_key;
use crate::{FieldError, RouterError, Validate, ValidationResult, ValidationRules};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Keys without `/` are valid path segments
    #[test]
    fn prop_plain_keys_accepted(key in "[a-zA-Z0-9_.-]{1,20}") {
        prop_assert!(validate_route_key(&key, "").is_ok(), "'{}' should be accepted", key);
    }

    /// Keys containing `/` are rejected with the parent path attached
    #[test]
    fn prop_slashed_keys_rejected(
        prefix in "[a-z]{0,5}",
        suffix in "[a-z]{0,5}",
        parent in "[a-z]{1,5}(/[a-z]{1,5}){0,2}",
    ) {
        let key = format!("{}/{}", prefix, suffix);
        prop_assert_eq!(
            validate_route_key(&key, &parent),
            Err(RouterError::InvalidSegment { key, parent })
        );
    }

    /// Strings within the bounds pass both length rules
    #[test]
    fn prop_length_bounds(value in "[a-z]{3,10}") {
        let result = ValidationRules::new()
            .min_length("name", &value, 3)
            .max_length("name", &value, 10)
            .build();
        prop_assert!(result.is_valid());
    }

    /// Numbers outside the range are reported once
    #[test]
    fn prop_out_of_range(value in 101i64..10_000) {
        let result = ValidationRules::new().range("age", value, 0, 100).build();
        prop_assert_eq!(result.errors(), &[FieldError::range("age", 0, 100)][..]);
    }
}

#[test]
fn test_empty_key_rejected() {
    assert_eq!(
        validate_route_key("", "admin"),
        Err(RouterError::InvalidSegment {
            key: String::new(),
            parent: "admin".into(),
        })
    );
}

#[test]
fn test_required_and_present() {
    let result = ValidationRules::new()
        .required("name", "   ")
        .present("password", None)
        .present("username", Some("admin"))
        .build();

    assert!(!result.is_valid());
    let messages: Vec<_> = result.errors().iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["name is required", "password is required"]);
}

#[test]
fn test_email_rule() {
    for valid in ["pepa@example.com", "a.b@c.cz"] {
        assert!(ValidationRules::new().email("email", valid).build().is_valid());
    }
    for invalid in ["", "pepa", "@example.com", "pepa@example", "pepa@.com", "a@b@c.cz"] {
        assert!(
            !ValidationRules::new().email("email", invalid).build().is_valid(),
            "'{}' should be rejected",
            invalid
        );
    }
}

#[test]
fn test_pattern_rule() {
    let ok = ValidationRules::new()
        .pattern("phone", "+420123456789", r"^\+?[0-9]{10,15}$")
        .build();
    assert!(ok.is_valid());

    let bad = ValidationRules::new()
        .pattern("phone", "call me", r"^\+?[0-9]{10,15}$")
        .build();
    assert_eq!(bad.errors()[0].code, "pattern");

    let broken = ValidationRules::new().pattern("phone", "x", "(").build();
    assert_eq!(broken.errors()[0].code, "invalid_pattern");
}

#[test]
fn test_custom_rule_and_merge() {
    let first = ValidationRules::new()
        .custom("password", || "short".len() >= 8, "password is too short")
        .build();
    let second = ValidationRules::new()
        .add_error(FieldError::custom("terms", "terms must be accepted"))
        .build();

    let merged = first.merge(second).merge(ValidationResult::ok());
    assert!(!merged.is_valid());
    assert_eq!(merged.errors().len(), 2);
    assert_eq!(merged.errors()[0].message, "password is too short");
    assert_eq!(merged.errors()[1].field, "terms");
}

#[test]
fn test_option_validates_inner_value() {
    struct Named(String);

    impl Validate for Named {
        fn validate(&self) -> ValidationResult {
            ValidationRules::new().required("name", &self.0).build()
        }
    }

    assert!(None::<Named>.validate().is_valid());
    assert!(Some(Named("Pepa".into())).validate().is_valid());
    assert!(!Some(Named(String::new())).validate().is_valid());
}

#[test]
fn test_from_errors_empty_is_valid() {
    assert!(ValidationResult::from_errors(Vec::new()).is_valid());
    assert_eq!(ValidationResult::default(), ValidationResult::ok());
}
