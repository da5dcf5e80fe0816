use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(SessionId);
id_type!(ClassId);
id_type!(SubjectId);
id_type!(StudentId);

/// Timetable days. The school week runs Monday through Saturday; there
/// is no Sunday slot. Declaration order is presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

/// One slot of the teacher's timetable, as returned by the schedule
/// catalog. Immutable on the client; a teacher may have many, and the
/// same class/subject pair can appear in several slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeachingSession {
    pub id: SessionId,
    pub day: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub class_id: ClassId,
    pub class_name: String,
    pub subject_id: SubjectId,
    pub subject_name: String,
}

/// Orders a catalog by `(day, start_time)` for stable option listings.
/// Ties keep the server's order.
pub fn order_sessions(sessions: &mut [TeachingSession]) {
    sessions.sort_by_key(|s| (s.day, s.start_time));
}
