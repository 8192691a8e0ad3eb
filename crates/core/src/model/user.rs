use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::UserId;
use crate::roles::{Role, RoleSet};

const MAX_PHONE_LEN: usize = 15;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("username cannot be empty")]
    EmptyUsername,

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("phone number must be at most 15 characters")]
    PhoneTooLong,
}

//
// ─── PROFILE ───────────────────────────────────────────────────────────────────
//

/// Optional personal details attached to a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub bio: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub phone_number: Option<String>,
}

//
// ─── USER ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<Role>,
    pub is_superuser: bool,
    pub profile: UserProfile,
}

impl UserDraft {
    /// Draft for a regular member of one group.
    #[must_use]
    pub fn with_role(username: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            first_name: String::new(),
            last_name: String::new(),
            role: Some(role),
            is_superuser: false,
            profile: UserProfile::default(),
        }
    }

    /// # Errors
    ///
    /// Returns `UserError` if the username is blank, the email is malformed,
    /// or the phone number is too long.
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewUser, UserError> {
        let username = self.username.trim().to_owned();
        if username.is_empty() {
            return Err(UserError::EmptyUsername);
        }

        let email = self.email.trim().to_owned();
        if !email.is_empty() && !is_plausible_email(&email) {
            return Err(UserError::InvalidEmail(email));
        }

        let mut profile = self.profile;
        profile.phone_number = profile
            .phone_number
            .map(|p| p.trim().to_owned())
            .filter(|p| !p.is_empty());
        if profile
            .phone_number
            .as_ref()
            .is_some_and(|p| p.chars().count() > MAX_PHONE_LEN)
        {
            return Err(UserError::PhoneTooLong);
        }

        Ok(NewUser {
            username,
            email,
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            roles: self.role.map_or_else(RoleSet::empty, RoleSet::only),
            is_superuser: self.is_superuser,
            profile,
            date_joined: now,
        })
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

/// A validated user that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: RoleSet,
    pub is_superuser: bool,
    pub profile: UserProfile,
    pub date_joined: DateTime<Utc>,
}

impl NewUser {
    #[must_use]
    pub fn assign_id(self, id: UserId) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            roles: self.roles,
            is_superuser: self.is_superuser,
            is_active: true,
            profile: self.profile,
            date_joined: self.date_joined,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: RoleSet,
    pub is_superuser: bool,
    pub is_active: bool,
    pub profile: UserProfile,
    pub date_joined: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }

    #[must_use]
    pub fn is_admin_or_superuser(&self) -> bool {
        self.is_superuser || self.has_role(Role::Admin)
    }

    /// Saving a profile role replaces any previous group membership.
    pub fn assign_role(&mut self, role: Role) {
        self.roles = RoleSet::only(role);
    }

    /// First name when set, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.first_name.is_empty() {
            &self.username
        } else {
            &self.first_name
        }
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
