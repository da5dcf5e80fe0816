use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::{ClassId, SubjectId};
use crate::error::ValidationError;

/// Attendance statuses accepted by the record store. Wire strings are
/// exactly the variant names; declaration order is the entry panel's
/// column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Excused,
    Late,
    Absent,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Present,
        AttendanceStatus::Excused,
        AttendanceStatus::Late,
        AttendanceStatus::Absent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Excused => "Excused",
            AttendanceStatus::Late => "Late",
            AttendanceStatus::Absent => "Absent",
        }
    }
}

/// A grade validated into `[0, 100]` at construction. NaN and infinite
/// inputs are rejected, so stored scores always compare cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GradeScore(f64);

impl GradeScore {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;

    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ValidationError::ScoreOutOfRange { value });
        }
        Ok(GradeScore(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl<'de> Deserialize<'de> for GradeScore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        GradeScore::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Assessment-type tags for grade entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentKind {
    Quiz1,
    Quiz2,
    Midterm,
    Final,
    Assignment,
}

impl AssessmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentKind::Quiz1 => "QUIZ1",
            AssessmentKind::Quiz2 => "QUIZ2",
            AssessmentKind::Midterm => "MIDTERM",
            AssessmentKind::Final => "FINAL",
            AssessmentKind::Assignment => "ASSIGNMENT",
        }
    }

    pub fn from_tag(tag: &str) -> Option<AssessmentKind> {
        match tag {
            "QUIZ1" => Some(AssessmentKind::Quiz1),
            "QUIZ2" => Some(AssessmentKind::Quiz2),
            "MIDTERM" => Some(AssessmentKind::Midterm),
            "FINAL" => Some(AssessmentKind::Final),
            "ASSIGNMENT" => Some(AssessmentKind::Assignment),
            _ => None,
        }
    }
}

/// The two record families the engine edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Attendance,
    Grade,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Attendance => "attendance",
            RecordKind::Grade => "grade",
        }
    }

    /// Baseline value for a student with no stored record. "Assume
    /// present" is a safe operational default; "assume a score" is not,
    /// so grades start unset.
    pub fn default_value(&self) -> Option<RecordValue> {
        match self {
            RecordKind::Attendance => {
                Some(RecordValue::Attendance(AttendanceStatus::Present))
            }
            RecordKind::Grade => None,
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The period component of a scope: a calendar date for attendance, an
/// assessment tag for grades. The variant fixes the record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeriodKey {
    Date(NaiveDate),
    Assessment(AssessmentKind),
}

impl PeriodKey {
    pub fn kind(&self) -> RecordKind {
        match self {
            PeriodKey::Date(_) => RecordKind::Attendance,
            PeriodKey::Assessment(_) => RecordKind::Grade,
        }
    }

    /// The plain identifier carried on the wire: an ISO date or an
    /// assessment tag.
    pub fn as_wire(&self) -> String {
        match self {
            PeriodKey::Date(date) => date.format("%Y-%m-%d").to_string(),
            PeriodKey::Assessment(kind) => kind.as_str().to_string(),
        }
    }

    pub fn parse(kind: RecordKind, raw: &str) -> Result<PeriodKey, ValidationError> {
        match kind {
            RecordKind::Attendance => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(PeriodKey::Date)
                .map_err(|_| ValidationError::BadPeriod {
                    kind,
                    raw: raw.to_string(),
                }),
            RecordKind::Grade => AssessmentKind::from_tag(raw)
                .map(PeriodKey::Assessment)
                .ok_or_else(|| ValidationError::BadPeriod {
                    kind,
                    raw: raw.to_string(),
                }),
        }
    }
}

/// Identity of the record set being edited. Together with a student id
/// this is the idempotence key for upserts: same scope, same student,
/// same logical record. The kind is a function of the period variant,
/// so a scope can never disagree with its period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeKey {
    pub class_id: ClassId,
    pub subject_id: SubjectId,
    pub period: PeriodKey,
}

impl ScopeKey {
    pub fn new(class_id: ClassId, subject_id: SubjectId, period: PeriodKey) -> ScopeKey {
        ScopeKey {
            class_id,
            subject_id,
            period,
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.period.kind()
    }
}

/// A record value of either family. On the wire an attendance value is
/// its status string and a grade is its bare number, matching the
/// record store's representation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordValue {
    Attendance(AttendanceStatus),
    Grade(GradeScore),
}

impl RecordValue {
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordValue::Attendance(_) => RecordKind::Attendance,
            RecordValue::Grade(_) => RecordKind::Grade,
        }
    }
}
