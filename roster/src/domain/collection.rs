//! In-memory member collection
//!
//! The authoritative list of members the front end renders. Order follows the
//! order the backend returned them in.

use tracing::debug;

use super::{MemberId, TeamMember};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberCollection {
    members: Vec<TeamMember>,
}

impl MemberCollection {
    pub fn new(members: Vec<TeamMember>) -> Self {
        debug!(count = members.len(), "MemberCollection::new: called");
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: &MemberId) -> bool {
        self.members.iter().any(|m| &m.id == id)
    }

    pub fn get(&self, id: &MemberId) -> Option<&TeamMember> {
        self.members.iter().find(|m| &m.id == id)
    }

    pub fn get_mut(&mut self, id: &MemberId) -> Option<&mut TeamMember> {
        self.members.iter_mut().find(|m| &m.id == id)
    }

    /// Remove a member, returning it if it was present
    pub fn remove(&mut self, id: &MemberId) -> Option<TeamMember> {
        let pos = self.members.iter().position(|m| &m.id == id)?;
        debug!(%id, pos, "MemberCollection::remove: removing");
        Some(self.members.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TeamMember> {
        self.members.iter()
    }

    pub fn members(&self) -> &[TeamMember] {
        &self.members
    }
}

impl From<Vec<TeamMember>> for MemberCollection {
    fn from(members: Vec<TeamMember>) -> Self {
        Self::new(members)
    }
}
