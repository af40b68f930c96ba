//! Domain primitives: UserId, CompetitionId, TeamId.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a user account, issued by the upstream auth layer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Create a UserId from a string.
    pub fn new(id: String) -> Self {
        UserId(id)
    }

    /// Get the id as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a competition (UUID, distinct from the short join code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompetitionId(pub Uuid);

impl CompetitionId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        CompetitionId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for CompetitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CompetitionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(CompetitionId)
    }
}

/// Identifier of a team within a competition (row id in the store).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub i64);

impl TeamId {
    pub fn new(id: i64) -> Self {
        TeamId(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_competition_id_roundtrip() {
        let id = CompetitionId::generate();
        let parsed = CompetitionId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_competition_id_rejects_garbage() {
        assert!(CompetitionId::from_str("not-a-uuid").is_err());
        assert!(CompetitionId::from_str("RALLY9").is_err());
    }

    #[test]
    fn test_user_id_display() {
        let user = UserId::new("driver-42".to_string());
        assert_eq!(user.to_string(), "driver-42");
    }

    #[test]
    fn test_team_id_ordering() {
        assert!(TeamId::new(1) < TeamId::new(2));
    }

    #[test]
    fn test_id_serialization_is_transparent() {
        let user = UserId::new("driver-42".to_string());
        assert_eq!(serde_json::to_string(&user).unwrap(), "\"driver-42\"");

        let team = TeamId::new(7);
        assert_eq!(serde_json::to_string(&team).unwrap(), "7");
    }
}
