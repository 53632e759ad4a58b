//! Domain types for the team roster

mod collection;
mod id;
mod member;

pub use collection::MemberCollection;
pub use id::MemberId;
pub use member::{NewMember, TeamMember, UpdatePayload, ValidationError};
