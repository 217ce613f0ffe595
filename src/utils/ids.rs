//! Opaque identifier generation for stored layout records.

use uuid::Uuid;

/// Generate a fresh opaque layout id: a 128-bit random value formatted as
/// 32 hex characters without separators, safe for use as a route parameter.
#[must_use]
pub fn generate_layout_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_32_hex_chars_without_separators() {
        let id = generate_layout_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn ids_are_unique_in_practice() {
        let a = generate_layout_id();
        let b = generate_layout_id();
        assert_ne!(a, b);
    }
}
