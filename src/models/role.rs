//! Learner roles and the dashboard each one lands on.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Teacher,
    Parent,
}

impl Role {
    /// Parse the role stored in user metadata. Missing or unknown values
    /// fall back to `Student`.
    pub fn from_metadata(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("teacher") => Role::Teacher,
            Some("parent") => Role::Parent,
            _ => Role::Student,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Parent => "parent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The landing view for a signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dashboard {
    Student,
    Teacher,
    Parent,
}

impl Dashboard {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Student => Dashboard::Student,
            Role::Teacher => Dashboard::Teacher,
            Role::Parent => Dashboard::Parent,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Dashboard::Student => "Student Dashboard",
            Dashboard::Teacher => "Teacher Dashboard",
            Dashboard::Parent => "Parent Dashboard",
        }
    }

    pub fn sections(&self) -> &'static [&'static str] {
        match self {
            Dashboard::Student => &["Continue learning", "Upcoming quizzes", "Health tracker"],
            Dashboard::Teacher => &["Class overview", "Assignments", "Student progress"],
            Dashboard::Parent => &["Child progress", "Recent quiz results", "Health tips"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_metadata() {
        assert_eq!(Role::from_metadata(Some("teacher")), Role::Teacher);
        assert_eq!(Role::from_metadata(Some("Parent")), Role::Parent);
        assert_eq!(Role::from_metadata(Some("admin")), Role::Student);
        assert_eq!(Role::from_metadata(None), Role::Student);
    }

    #[test]
    fn test_dashboard_dispatch() {
        assert_eq!(Dashboard::for_role(Role::Parent).title(), "Parent Dashboard");
        assert_eq!(Dashboard::for_role(Role::Student), Dashboard::Student);
        assert_eq!(Dashboard::for_role(Role::Teacher).sections().len(), 3);
    }
}
