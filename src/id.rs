//! Identifier generation for entries submitted without an id

use uuid::Uuid;

/// Source of fresh, unique entry identifiers
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random 128-bit (UUID v4) identifiers; collisions are not a practical concern
/// even for concurrent creates within the same millisecond.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uuid_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| UuidGenerator.generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_uuid_format() {
        let id = UuidGenerator.generate();
        assert_eq!(id.len(), 36);
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
