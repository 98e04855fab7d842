//! User entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Platform role. Mutually exclusive; derived from the user's skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Books sessions with teachers
    Student,
    /// Advertises skills and accepts bookings
    Teacher,
}

impl Role {
    /// Create from string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "student" => Some(Self::Student),
            "teacher" => Some(Self::Teacher),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Proficiency level for an advertised skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl SkillLevel {
    /// Create from string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            "expert" => Some(Self::Expert),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
            Self::Expert => "Expert",
        }
    }

    /// Whether this level qualifies the holder to teach the skill
    pub fn is_teaching_level(&self) -> bool {
        matches!(self, Self::Advanced | Self::Expert)
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A skill advertised by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillEntry {
    /// Skill name, matched case-insensitively
    pub name: String,
    /// Proficiency level
    pub level: SkillLevel,
}

impl SkillEntry {
    /// Create a new skill entry
    pub fn new(name: impl Into<String>, level: SkillLevel) -> Self {
        Self {
            name: name.into(),
            level,
        }
    }
}

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email, stored lowercased and unique
    pub email: String,

    /// Current role, derived from skills
    pub role: Role,

    /// Optional profile text
    pub bio: Option<String>,

    /// Advertised skills with proficiency levels
    pub skills: Vec<SkillEntry>,

    /// Aggregate rating from settled reviews (0.0 until first settlement)
    pub rating: f64,

    /// Number of settled ratings received
    pub rating_count: i64,

    /// When the user registered
    pub created_at: DateTime<Utc>,

    /// When the user was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user. Role is derived from the provided skills.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        skills: Vec<SkillEntry>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut user = Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into().to_lowercase(),
            role: Role::Student,
            bio: None,
            skills,
            rating: 0.0,
            rating_count: 0,
            created_at: now,
            updated_at: now,
        };
        user.update_role();
        user
    }

    /// Whether the user holds any skill at a teaching level
    pub fn can_be_teacher(&self) -> bool {
        self.skills.iter().any(|s| s.level.is_teaching_level())
    }

    /// Whether the user is qualified to teach the named skill.
    ///
    /// Requires the teacher role plus a case-insensitive name match at
    /// Advanced or Expert level.
    pub fn can_teach(&self, skill_name: &str) -> bool {
        self.role == Role::Teacher
            && self.skills.iter().any(|s| {
                s.name.eq_ignore_ascii_case(skill_name) && s.level.is_teaching_level()
            })
    }

    /// Recompute the role from the current skills
    pub fn update_role(&mut self) {
        self.role = if self.can_be_teacher() {
            Role::Teacher
        } else {
            Role::Student
        };
    }

    /// Refresh the updated-at timestamp
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
