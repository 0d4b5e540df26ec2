//! Deterministic naming of remote resources
//!
//! The broker never records what it created. Every vhost and user is named from
//! the identifiers the platform supplies, so deprovision and unbind can find the
//! same resources again.
//!
//! - vhost: the instance identifier
//! - management user: `m-<vhost>`
//! - binding user: `u-<digest>` over the (instance, binding) pair
//!
//! The binding digest length-prefixes the instance identifier, so pairs such as
//! `("a-b", "c")` and `("a", "b-c")` never map to the same user.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256};

/// Prefix of the per-instance management user
pub const MANAGEMENT_USER_PREFIX: &str = "m-";

/// Prefix of per-binding users
pub const BINDING_USER_PREFIX: &str = "u-";

/// Name of the vhost backing an instance
pub fn vhost_name(instance_id: &str) -> String {
    instance_id.to_string()
}

/// Name of the management user of a vhost
pub fn management_username(vhost: &str) -> String {
    format!("{}{}", MANAGEMENT_USER_PREFIX, vhost)
}

/// Name of the user created for a binding
pub fn binding_username(instance_id: &str, binding_id: &str) -> String {
    let digest = Sha256::digest(binding_seed(instance_id, binding_id).as_bytes());
    format!("{}{}", BINDING_USER_PREFIX, URL_SAFE_NO_PAD.encode(digest))
}

/// Seed used to derive a binding user's secret
pub fn binding_seed(instance_id: &str, binding_id: &str) -> String {
    format!("{}:{}/{}", instance_id.len(), instance_id, binding_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vhost_is_instance_id() {
        assert_eq!(vhost_name("abc"), "abc");
    }

    #[test]
    fn test_management_username() {
        assert_eq!(management_username("abc"), "m-abc");
    }

    #[test]
    fn test_binding_username_is_stable() {
        let first = binding_username("abc", "b1");
        let second = binding_username("abc", "b1");

        assert_eq!(first, second);
        assert!(first.starts_with(BINDING_USER_PREFIX));
    }

    #[test]
    fn test_separator_ambiguity() {
        assert_ne!(binding_username("a-b", "c"), binding_username("a", "b-c"));
        assert_ne!(binding_username("a/b", "c"), binding_username("a", "b/c"));
        assert_ne!(binding_seed("a/b", "c"), binding_seed("a", "b/c"));
    }

    #[test]
    fn test_bindings_on_same_instance_differ() {
        assert_ne!(binding_username("abc", "b1"), binding_username("abc", "b2"));
    }
}
