//! Property-Based Tests for resource naming and secrets
//!
//! These tests verify, for arbitrary identifiers:
//! 1. Names are deterministic: unbind targets the user that bind created
//! 2. Names never collide across bindings or with the management user
//! 3. Generated secrets are safe for Basic-Auth and URIs
//!
//! Uses proptest for property-based testing with arbitrary inputs.

use broker_core::credentials::{DeterministicGenerator, RandomGenerator, SecretGenerator};
use broker_core::naming::{binding_seed, binding_username, management_username, vhost_name};
use broker_core::ApiVersion;
use proptest::prelude::*;

fn is_uri_safe(value: &str) -> bool {
    value
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

proptest! {
    /// Bind followed by unbind must compute the same username
    #[test]
    fn prop_binding_username_is_deterministic(
        instance in ".*",
        binding in ".*",
    ) {
        prop_assert_eq!(
            binding_username(&instance, &binding),
            binding_username(&instance, &binding)
        );
    }

    /// Binding usernames only use characters safe in a URI userinfo
    #[test]
    fn prop_binding_username_is_uri_safe(
        instance in ".*",
        binding in ".*",
    ) {
        let username = binding_username(&instance, &binding);
        prop_assert!(username.starts_with("u-"));
        prop_assert!(is_uri_safe(&username), "unsafe username {}", username);
    }

    /// Distinct identifier pairs never share a binding user
    #[test]
    fn prop_distinct_pairs_get_distinct_users(
        a in ("[a-z0-9/:-]{0,8}", "[a-z0-9/:-]{0,8}"),
        b in ("[a-z0-9/:-]{0,8}", "[a-z0-9/:-]{0,8}"),
    ) {
        prop_assume!(a != b);
        prop_assert_ne!(binding_username(&a.0, &a.1), binding_username(&b.0, &b.1));
        prop_assert_ne!(binding_seed(&a.0, &a.1), binding_seed(&b.0, &b.1));
    }

    /// A binding user never shadows the management user of any instance
    #[test]
    fn prop_binding_user_differs_from_management_user(
        instance in ".*",
        other in ".*",
        binding in ".*",
    ) {
        prop_assert_ne!(
            binding_username(&instance, &binding),
            management_username(&vhost_name(&other))
        );
    }

    /// Deterministic secrets are repeatable and URI safe
    #[test]
    fn prop_deterministic_secret(seed in ".*", salt in ".*") {
        let generator = DeterministicGenerator::with_salt(&salt);
        let first = generator.generate(&seed).unwrap();
        let second = generator.generate(&seed).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert!(is_uri_safe(&first));
    }

    /// Random secrets are URI safe regardless of strength
    #[test]
    fn prop_random_secret_is_uri_safe(strength in 0usize..64) {
        let secret = RandomGenerator::with_strength(strength).generate("ignored").unwrap();
        prop_assert!(is_uri_safe(&secret));
        prop_assert!(secret.len() >= 22);
    }

    /// Any two non-negative integers form a valid version
    #[test]
    fn prop_version_parses(major in 0u32..1000, minor in 0u32..1000) {
        let parsed: ApiVersion = format!("{}.{}", major, minor).parse().unwrap();
        prop_assert_eq!(parsed, ApiVersion::new(major, minor));
    }
}
