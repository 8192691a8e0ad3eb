//! Role membership and dashboard routing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::User;
use crate::routes::Route;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

/// The four roles a user can be a member of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Instructor,
    Student,
    Sponsor,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Instructor, Role::Student, Role::Sponsor];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Instructor => "instructor",
            Role::Student => "student",
            Role::Sponsor => "sponsor",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Role::Admin => 1 << 0,
            Role::Instructor => 1 << 1,
            Role::Student => 1 << 2,
            Role::Sponsor => 1 << 3,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(Role::Admin),
            "instructor" => Ok(Role::Instructor),
            "student" => Ok(Role::Student),
            "sponsor" => Ok(Role::Sponsor),
            other => Err(RoleParseError(other.to_owned())),
        }
    }
}

/// Group membership stored as a bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(u8);

impl RoleSet {
    #[must_use]
    pub fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub fn only(role: Role) -> Self {
        Self(role.bit())
    }

    /// Rebuilds a set from its persisted mask, dropping unknown bits.
    #[must_use]
    pub fn from_mask(mask: u8) -> Self {
        let known = Role::ALL.iter().fold(0, |acc, role| acc | role.bit());
        Self(mask & known)
    }

    #[must_use]
    pub fn mask(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn with(self, role: Role) -> Self {
        Self(self.0 | role.bit())
    }

    #[must_use]
    pub fn contains(self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |role| self.contains(*role))
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        iter.into_iter().fold(Self::empty(), RoleSet::with)
    }
}

/// The primary role used for dashboard routing.
///
/// Precedence is fixed: admin (or superuser), student, instructor, sponsor.
/// Returns `None` when the user belongs to no group and is not a superuser.
#[must_use]
pub fn primary_role(roles: RoleSet, is_superuser: bool) -> Option<Role> {
    if is_superuser || roles.contains(Role::Admin) {
        return Some(Role::Admin);
    }
    [Role::Student, Role::Instructor, Role::Sponsor]
        .into_iter()
        .find(|role| roles.contains(*role))
}

/// Resolves which dashboard a user lands on.
#[must_use]
pub fn dashboard_route(user: &User) -> Route {
    match primary_role(user.roles, user.is_superuser) {
        Some(Role::Admin) => Route::AdminDashboard,
        Some(Role::Student) => Route::StudentDashboard,
        Some(Role::Instructor) => Route::InstructorDashboard,
        Some(Role::Sponsor) => Route::SponsorDashboard,
        None => Route::Home,
    }
}
