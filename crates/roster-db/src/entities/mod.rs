//! Database entities

pub mod operator;
pub mod owner;
pub mod person;
pub mod team;
pub mod team_member;

pub use operator::Entity as Operator;
pub use owner::Entity as Owner;
pub use person::Entity as Person;
pub use team::Entity as Team;
pub use team_member::Entity as TeamMember;

pub mod prelude {
    pub use super::operator::Entity as Operator;
    pub use super::owner::Entity as Owner;
    pub use super::person::Entity as Person;
    pub use super::team::Entity as Team;
    pub use super::team_member::Entity as TeamMember;
}
