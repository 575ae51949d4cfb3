use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Role of a staff member, evaluated per distribution run.
/// Proctors go into rooms (pinned or shuffled); monitors and reserves never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObserverRole {
    Proctor,
    Monitor,
    Reserve,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub department: Option<String>,
    pub role: ObserverRole,
}

/// An administrative group of exam rooms, e.g. one grade's committee.
/// Leadership names are only used for export and display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Committee {
    pub id: String,
    pub name: String,
    pub sub_committees: u32,
    pub observers_per_room: u32,
    #[serde(default)]
    pub head_name: Option<String>,
    #[serde(default)]
    pub assistant1: Option<String>,
    #[serde(default)]
    pub assistant2: Option<String>,
}

impl Committee {
    /// The five standard grade committees used for quick setup.
    pub fn grade_defaults(stamp: i64) -> Vec<Committee> {
        let presets: [(&str, &str, u32); 5] = [
            ("grade-10", "Grade 10 Committee", 8),
            ("grade-11s", "Grade 11 Science Committee", 6),
            ("grade-11a", "Grade 11 Arts Committee", 5),
            ("grade-12s", "Grade 12 Science Committee", 6),
            ("grade-12a", "Grade 12 Arts Committee", 5),
        ];
        presets
            .iter()
            .map(|(slug, name, rooms)| Committee {
                id: format!("{}-{}", slug, stamp),
                name: name.to_string(),
                sub_committees: *rooms,
                observers_per_room: 2,
                head_name: None,
                assistant1: None,
                assistant2: None,
            })
            .collect()
    }
}

/// One of the ten fixed exam days. Identity (`day-1`..`day-10`) is stable;
/// date, weekday and the five subject labels are freely editable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamDay {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub day_of_week: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub subject_10: String,
    #[serde(default)]
    pub subject_11_sci: String,
    #[serde(default)]
    pub subject_11_arts: String,
    #[serde(default)]
    pub subject_12_sci: String,
    #[serde(default)]
    pub subject_12_arts: String,
}

impl ExamDay {
    /// The fresh ten-day schedule used when no saved data exists.
    pub fn ten_days() -> Vec<ExamDay> {
        (1..=10)
            .map(|n| ExamDay {
                id: format!("day-{}", n),
                label: format!("Day {}", n),
                day_of_week: String::new(),
                date: String::new(),
                subject_10: String::new(),
                subject_11_sci: String::new(),
                subject_11_arts: String::new(),
                subject_12_sci: String::new(),
                subject_12_arts: String::new(),
            })
            .collect()
    }

    /// Combined subject line for display and export, one tag per grade track.
    pub fn subject_summary(&self) -> String {
        let tagged = [
            ("10", &self.subject_10),
            ("11S", &self.subject_11_sci),
            ("11A", &self.subject_11_arts),
            ("12S", &self.subject_12_sci),
            ("12A", &self.subject_12_arts),
        ];
        let parts: Vec<String> = tagged
            .iter()
            .filter(|(_, subject)| !subject.is_empty())
            .map(|(tag, subject)| format!("({}: {})", tag, subject))
            .collect();
        if parts.is_empty() {
            "No subjects".to_string()
        } else {
            parts.join(" | ")
        }
    }

    /// ISO date rendered as DD/MM/YYYY for the printed sheets.
    pub fn display_date(&self) -> String {
        if self.date.is_empty() {
            return String::new();
        }
        self.date.rsplit('-').collect::<Vec<&str>>().join("/")
    }
}

/// English weekday name for an ISO date, None if the date does not parse.
pub fn weekday_name(date: &str) -> Option<String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%A").to_string())
}

/// A fixed (committee, room) placement for one proctor on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedSeat {
    pub committee_id: String,
    pub sub_committee: u32,
}

/// One room's assignment as produced by a distribution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomAssignment {
    pub committee_name: String,
    pub sub_committee: u32,
    pub observers: Vec<Observer>,
}

/// The frozen output of the most recent run for one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayRecord {
    pub rooms: Vec<RoomAssignment>,
    pub monitors: Vec<Observer>,
    pub reserves: Vec<Observer>,
    pub timestamp: i64,
}

/// Day id -> ids of observers marked absent on that day.
pub type AbsenceMap = HashMap<String, HashSet<String>>;

/// Day id -> observer id -> pinned seat.
pub type PinMap = HashMap<String, HashMap<String, PinnedSeat>>;

/// Day id -> frozen result of the last run for that day.
pub type HistoryMap = HashMap<String, DayRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_days_have_stable_ids() {
        let days = ExamDay::ten_days();
        assert_eq!(days.len(), 10);
        assert_eq!(days[0].id, "day-1");
        assert_eq!(days[9].id, "day-10");
        assert_eq!(days[4].label, "Day 5");
    }

    #[test]
    fn subject_summary_skips_empty_tracks() {
        let mut day = ExamDay::ten_days().remove(0);
        assert_eq!(day.subject_summary(), "No subjects");

        day.subject_10 = "Math".to_string();
        day.subject_12_sci = "Physics".to_string();
        assert_eq!(day.subject_summary(), "(10: Math) | (12S: Physics)");
    }

    #[test]
    fn display_date_reverses_iso_order() {
        let mut day = ExamDay::ten_days().remove(0);
        assert_eq!(day.display_date(), "");

        day.date = "2026-03-15".to_string();
        assert_eq!(day.display_date(), "15/03/2026");
    }

    #[test]
    fn weekday_name_follows_the_calendar() {
        assert_eq!(weekday_name("2026-03-15").as_deref(), Some("Sunday"));
        assert_eq!(weekday_name("2026-03-16").as_deref(), Some("Monday"));
        assert_eq!(weekday_name("not-a-date"), None);
    }

    #[test]
    fn grade_defaults_cover_all_tracks() {
        let committees = Committee::grade_defaults(7);
        assert_eq!(committees.len(), 5);
        let rooms: u32 = committees.iter().map(|c| c.sub_committees).sum();
        assert_eq!(rooms, 30);
        assert!(committees.iter().all(|c| c.observers_per_room == 2));
        assert!(committees.iter().all(|c| c.id.ends_with("-7")));
    }
}
