use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use racha_core::{DomainError, DomainResult, ParticipantId, UserId};

use crate::event_record::UserProfile;

/// Someone sharing expenses within one event.
///
/// Participants are never removed: deactivation flips `is_active` so historical
/// shares keep resolving to a stable identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub linked_user: Option<UserId>,
    pub payment_address: Option<String>,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
}

/// Participant identity and activation state for one event, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantRegistry {
    participants: Vec<Participant>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All participants, active or not, in creation order.
    pub fn all(&self) -> &[Participant] {
        &self.participants
    }

    pub fn active(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| p.is_active)
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn require(&self, id: ParticipantId) -> DomainResult<&Participant> {
        self.get(id).ok_or_else(|| DomainError::not_found("participant"))
    }

    pub fn by_linked_user(&self, user: UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.linked_user == Some(user))
    }

    pub fn is_active(&self, id: ParticipantId) -> bool {
        self.get(id).is_some_and(|p| p.is_active)
    }

    /// Whether `user` is linked to any participant (active or not).
    pub fn has_member(&self, user: UserId) -> bool {
        self.by_linked_user(user).is_some()
    }

    /// Whether `user` is linked to a currently active participant.
    pub fn has_active_member(&self, user: UserId) -> bool {
        self.by_linked_user(user).is_some_and(|p| p.is_active)
    }

    pub(crate) fn insert(&mut self, participant: Participant) {
        self.participants.push(participant);
    }

    pub(crate) fn deactivate(&mut self, id: ParticipantId) {
        if let Some(p) = self.participants.iter_mut().find(|p| p.id == id) {
            p.is_active = false;
        }
    }

    pub(crate) fn set_payment_address(&mut self, id: ParticipantId, address: Option<String>) {
        if let Some(p) = self.participants.iter_mut().find(|p| p.id == id) {
            p.payment_address = address;
        }
    }
}

/// Display name for a new participant: the explicit name wins, else the linked
/// user's display name.
pub(crate) fn resolve_name(
    name: Option<&str>,
    linked_user: Option<UserId>,
    profile: Option<&UserProfile>,
) -> DomainResult<String> {
    let explicit = name.map(str::trim).filter(|n| !n.is_empty());

    match (explicit, linked_user, profile) {
        (None, None, _) => Err(DomainError::validation(
            "a participant needs a name or a linked user",
        )),
        (_, Some(user), None) => Err(DomainError::validation(format!(
            "user {user} does not exist"
        ))),
        (Some(n), _, _) => Ok(n.to_string()),
        (None, Some(_), Some(p)) => {
            let display = p.display_name.trim();
            if display.is_empty() {
                Err(DomainError::validation("linked user has no display name; provide a name"))
            } else {
                Ok(display.to_string())
            }
        }
    }
}

/// Blank addresses clear the field.
pub(crate) fn normalize_address(address: Option<&str>) -> Option<String> {
    address
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(name: &str, linked: Option<UserId>) -> Participant {
        Participant {
            id: ParticipantId::new(),
            name: name.to_string(),
            linked_user: linked,
            payment_address: None,
            is_active: true,
            joined_at: Utc::now(),
        }
    }

    #[test]
    fn deactivation_keeps_the_participant_resolvable() {
        let mut registry = ParticipantRegistry::new();
        let ana = participant("Ana", None);
        let id = ana.id;
        registry.insert(ana);

        registry.deactivate(id);

        let found = registry.require(id).unwrap();
        assert!(!found.is_active);
        assert_eq!(found.name, "Ana");
        assert_eq!(registry.active().count(), 0);
        assert_eq!(registry.all().len(), 1);
    }

    #[test]
    fn membership_lookups_follow_linked_users() {
        let mut registry = ParticipantRegistry::new();
        let user = UserId::new();
        let bruno = participant("Bruno", Some(user));
        let id = bruno.id;
        registry.insert(bruno);

        assert!(registry.has_active_member(user));
        registry.deactivate(id);
        assert!(registry.has_member(user));
        assert!(!registry.has_active_member(user));
        assert!(!registry.has_member(UserId::new()));
    }

    #[test]
    fn explicit_name_wins_over_profile() {
        let user = UserId::new();
        let profile = UserProfile {
            id: user,
            display_name: "Carla Souza".to_string(),
            payment_address: None,
        };

        assert_eq!(
            resolve_name(Some("  Carla "), Some(user), Some(&profile)).unwrap(),
            "Carla"
        );
        assert_eq!(
            resolve_name(None, Some(user), Some(&profile)).unwrap(),
            "Carla Souza"
        );
    }

    #[test]
    fn name_resolution_rejects_missing_identity() {
        assert!(matches!(
            resolve_name(Some("   "), None, None),
            Err(DomainError::Validation(_))
        ));

        let unknown = UserId::new();
        let err = resolve_name(Some("Dani"), Some(unknown), None).unwrap_err();
        assert_eq!(err, DomainError::validation(format!("user {unknown} does not exist")));
    }

    #[test]
    fn blank_address_is_cleared() {
        assert_eq!(normalize_address(Some("  ")), None);
        assert_eq!(normalize_address(Some(" ana@pix ")), Some("ana@pix".to_string()));
        assert_eq!(normalize_address(None), None);
    }
}
