//! Deterministic codename to UUID derivation.
//!
//! Rich-text components are addressed by a local UUID rather than a
//! codename. When content crosses environments the component id must stay
//! stable, so it is derived from the component's codename: a codename that
//! is itself a UUID (modulo `_` vs `-`) is used directly, anything else is
//! hashed with UUID-v5 under a fixed namespace.

use uuid::Uuid;

/// Derives the UUID for a component codename.
///
/// A codename whose `_`-normalized form parses as a UUID is taken verbatim.
/// Otherwise the UUID is the v5 hash of the codename bytes under
/// [`Uuid::NAMESPACE_URL`], which is stable across runs and machines.
pub fn uuid_for_codename(codename: &str) -> Uuid {
    let normalized = codename.replace('_', "-");
    match Uuid::parse_str(&normalized) {
        Ok(id) => id,
        Err(_) => Uuid::new_v5(&Uuid::NAMESPACE_URL, codename.as_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_codename_hashes_deterministically() {
        let first = uuid_for_codename("hero_banner");
        let second = uuid_for_codename("hero_banner");
        assert_eq!(first, second);
        assert_eq!(
            first,
            Uuid::new_v5(&Uuid::NAMESPACE_URL, "hero_banner".as_bytes())
        );
    }

    #[test]
    fn test_distinct_codenames_hash_differently() {
        assert_ne!(uuid_for_codename("hero_banner"), uuid_for_codename("hero"));
    }

    #[test]
    fn test_uuid_codename_is_used_verbatim() {
        let id = uuid_for_codename("8f7b4a1c-1234-4cde-9f01-aabbccddeeff");
        assert_eq!(
            id,
            Uuid::parse_str("8f7b4a1c-1234-4cde-9f01-aabbccddeeff").unwrap()
        );
    }

    #[test]
    fn test_underscored_uuid_codename_is_normalized() {
        let id = uuid_for_codename("8f7b4a1c_1234_4cde_9f01_aabbccddeeff");
        assert_eq!(
            id,
            Uuid::parse_str("8f7b4a1c-1234-4cde-9f01-aabbccddeeff").unwrap()
        );
    }
}
