use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

/// A single rating as stored by the score collection subsystem.
#[derive(Debug, Clone)]
pub struct ScoreEvent {
    pub track_id: String,
    pub student_id: String,
    pub metric_id: String,
    pub rater_role: String,
    pub value_raw: f64,
    pub occurred_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct TrackWindow {
    pub track_id: String,
    pub start_at: Option<NaiveDateTime>,
    pub end_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Teacher,
    Mentor,
}

impl Role {
    /// Roles arrive as free text from the rating tables; anything else is `None`.
    pub fn from_label(label: &str) -> Option<Role> {
        match label.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            "mentor" => Some(Role::Mentor),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Mentor => "mentor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per rater role.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerRole<T> {
    pub student: T,
    pub teacher: T,
    pub mentor: T,
}

impl<T> PerRole<T> {
    pub fn get_mut(&mut self, role: Role) -> &mut T {
        match role {
            Role::Student => &mut self.student,
            Role::Teacher => &mut self.teacher,
            Role::Mentor => &mut self.mentor,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> PerRole<U> {
        PerRole {
            student: f(self.student),
            teacher: f(self.teacher),
            mentor: f(self.mentor),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerKind {
    Server,
    Client,
    Demo,
}

impl std::str::FromStr for CallerKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "server" => Ok(CallerKind::Server),
            "client" => Ok(CallerKind::Client),
            "demo" => Ok(CallerKind::Demo),
            other => Err(format!("unknown caller kind `{other}`")),
        }
    }
}

/// Who is asking. Issued by the auth layer; the engine only reads it.
#[derive(Debug, Clone)]
pub struct Caller {
    pub kind: CallerKind,
    pub user_id: Option<String>,
}

impl Caller {
    pub fn server() -> Self {
        Self {
            kind: CallerKind::Server,
            user_id: None,
        }
    }

    pub fn client(user_id: impl Into<String>) -> Self {
        Self {
            kind: CallerKind::Client,
            user_id: Some(user_id.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub t: String,
    pub self_weighted: f64,
    pub teacher_weighted: f64,
    pub mentor_weighted: f64,
    pub composite: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesResponse {
    pub interval: &'static str,
    pub points: Vec<SeriesPoint>,
}
