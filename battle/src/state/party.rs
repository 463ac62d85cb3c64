//! One side's party

use super::StateError;
use crate::types::Combatant;

/// Largest party a side can field
pub const MAX_PARTY_SIZE: usize = 6;

/// Ordered party with a designated active member
///
/// The active member is held as an index, so it always refers to an element
/// of `members`. Members are replaced whole, never patched in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Party {
    members: Vec<Combatant>,
    active: usize,
}

impl Party {
    pub fn new(members: Vec<Combatant>, active: usize) -> Result<Self, StateError> {
        if members.is_empty() {
            return Err(StateError::EmptyParty);
        }
        if members.len() > MAX_PARTY_SIZE {
            return Err(StateError::PartyTooLarge(members.len()));
        }
        if active >= members.len() {
            return Err(StateError::IndexOutOfRange {
                index: active,
                len: members.len(),
            });
        }
        for (i, member) in members.iter().enumerate() {
            if members[..i].iter().any(|m| m.id == member.id) {
                return Err(StateError::DuplicateMember(member.id.clone()));
            }
        }
        Ok(Self { members, active })
    }

    /// Party whose first living member leads, or the first member if all
    /// have fainted
    pub fn leading_with_first_alive(members: Vec<Combatant>) -> Result<Self, StateError> {
        let active = members.iter().position(|m| m.is_alive()).unwrap_or(0);
        Self::new(members, active)
    }

    pub fn members(&self) -> &[Combatant] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &Combatant {
        &self.members[self.active]
    }

    pub fn get(&self, index: usize) -> Option<&Combatant> {
        self.members.get(index)
    }

    pub fn find(&self, id: &str) -> Option<&Combatant> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.members.iter().position(|m| m.id == id)
    }

    /// Make another member active
    pub fn set_active(&mut self, index: usize) -> Result<(), StateError> {
        self.check_index(index)?;
        self.active = index;
        Ok(())
    }

    /// Replace one member wholesale
    pub fn replace(&mut self, index: usize, member: Combatant) -> Result<(), StateError> {
        self.check_index(index)?;
        if let Some(other) = self.index_of(&member.id)
            && other != index
        {
            return Err(StateError::DuplicateMember(member.id));
        }
        self.members[index] = member;
        Ok(())
    }

    /// Replace the active member wholesale
    pub fn replace_active(&mut self, member: Combatant) -> Result<(), StateError> {
        self.replace(self.active, member)
    }

    /// Replace the active member's HP
    pub fn set_active_hp(&mut self, hp: u32) {
        let updated = self.active().with_hp(hp);
        self.members[self.active] = updated;
    }

    /// Insert or overwrite `member` at `index`, growing the party by one
    /// when `index == len()`
    pub fn put(&mut self, index: usize, member: Combatant) -> Result<(), StateError> {
        if index == self.members.len() && index < MAX_PARTY_SIZE {
            if self.index_of(&member.id).is_some() {
                return Err(StateError::DuplicateMember(member.id));
            }
            self.members.push(member);
            return Ok(());
        }
        self.replace(index, member)
    }

    /// Members other than the active one that can still fight
    pub fn reserves(&self) -> impl Iterator<Item = (usize, &Combatant)> {
        self.members
            .iter()
            .enumerate()
            .filter(move |(i, m)| *i != self.active && m.is_alive())
    }

    pub fn has_reserves(&self) -> bool {
        self.reserves().next().is_some()
    }

    fn check_index(&self, index: usize) -> Result<(), StateError> {
        if index < self.members.len() {
            Ok(())
        } else {
            Err(StateError::IndexOutOfRange {
                index,
                len: self.members.len(),
            })
        }
    }
}
