use std::error::Error;
use std::path::Path;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::distribution::{
    run_distribution, weekday_name, AbsenceMap, Committee, DayRecord, ExamDay, HistoryMap,
    Observer, ObserverRole, PinMap, PinnedSeat,
};
use crate::gemini::SampleData;

pub const DEFAULT_DATA_FILE: &str = "observer_data.json";

/// The whole application state: master data, the ten-day schedule, and the
/// per-day absence/pin/history maps. One instance owns everything; the
/// engine receives plain borrows of its fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppStore {
    #[serde(default)]
    pub observers: Vec<Observer>,
    #[serde(default)]
    pub committees: Vec<Committee>,
    #[serde(default = "ExamDay::ten_days")]
    pub schedule: Vec<ExamDay>,
    #[serde(default)]
    pub absence: AbsenceMap,
    #[serde(default)]
    pub pins: PinMap,
    #[serde(default)]
    pub history: HistoryMap,
}

impl Default for AppStore {
    fn default() -> Self {
        AppStore {
            observers: Vec::new(),
            committees: Vec::new(),
            schedule: ExamDay::ten_days(),
            absence: AbsenceMap::new(),
            pins: PinMap::new(),
            history: HistoryMap::new(),
        }
    }
}

/// Partial update for one schedule day. Setting a parseable date also
/// derives the weekday; an explicit day_of_week in the same update wins.
#[derive(Debug, Default, Deserialize)]
pub struct DayUpdate {
    pub date: Option<String>,
    pub day_of_week: Option<String>,
    pub subject_10: Option<String>,
    pub subject_11_sci: Option<String>,
    pub subject_11_arts: Option<String>,
    pub subject_12_sci: Option<String>,
    pub subject_12_arts: Option<String>,
}

/// Partial update for one committee.
#[derive(Debug, Default, Deserialize)]
pub struct CommitteeUpdate {
    pub name: Option<String>,
    pub sub_committees: Option<u32>,
    pub observers_per_room: Option<u32>,
    pub head_name: Option<String>,
    pub assistant1: Option<String>,
    pub assistant2: Option<String>,
}

impl AppStore {
    /// Loads the saved snapshot, falling back to defaults when the file is
    /// missing or unreadable. A broken file is reported and ignored, never
    /// a startup failure.
    pub fn load<P: AsRef<Path>>(path: P) -> AppStore {
        match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(store) => store,
                Err(e) => {
                    warn!("ignoring unreadable data file: {}", e);
                    AppStore::default()
                }
            },
            Err(_) => AppStore::default(),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn Error>> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn day(&self, day_id: &str) -> Option<&ExamDay> {
        self.schedule.iter().find(|d| d.id == day_id)
    }

    // --- roster ---

    pub fn add_observers(&mut self, new: Vec<Observer>) {
        self.observers.extend(new);
    }

    pub fn remove_observer(&mut self, id: &str) -> bool {
        let before = self.observers.len();
        self.observers.retain(|o| o.id != id);
        self.observers.len() != before
    }

    pub fn clear_observers(&mut self) {
        self.observers.clear();
    }

    pub fn update_observer(
        &mut self,
        id: &str,
        role: Option<ObserverRole>,
        department: Option<String>,
    ) -> bool {
        match self.observers.iter_mut().find(|o| o.id == id) {
            Some(obs) => {
                if let Some(role) = role {
                    obs.role = role;
                }
                if let Some(department) = department {
                    obs.department = if department.is_empty() {
                        None
                    } else {
                        Some(department)
                    };
                }
                true
            }
            None => false,
        }
    }

    /// How often this observer has sat in a room across all saved days.
    /// Monitor and reserve appearances do not count.
    pub fn observation_count(&self, observer_id: &str) -> usize {
        self.history
            .values()
            .flat_map(|record| record.rooms.iter())
            .flat_map(|room| room.observers.iter())
            .filter(|obs| obs.id == observer_id)
            .count()
    }

    // --- committees ---

    pub fn add_committee(&mut self, committee: Committee) {
        self.committees.push(committee);
    }

    pub fn add_default_committees(&mut self) {
        let stamp = Utc::now().timestamp_millis();
        self.committees.extend(Committee::grade_defaults(stamp));
    }

    pub fn remove_committee(&mut self, id: &str) -> bool {
        let before = self.committees.len();
        self.committees.retain(|c| c.id != id);
        self.committees.len() != before
    }

    pub fn update_committee(&mut self, id: &str, update: CommitteeUpdate) -> bool {
        match self.committees.iter_mut().find(|c| c.id == id) {
            Some(committee) => {
                if let Some(name) = update.name {
                    committee.name = name;
                }
                if let Some(rooms) = update.sub_committees {
                    committee.sub_committees = rooms;
                }
                if let Some(per_room) = update.observers_per_room {
                    committee.observers_per_room = per_room;
                }
                if let Some(head) = update.head_name {
                    committee.head_name = if head.is_empty() { None } else { Some(head) };
                }
                if let Some(first) = update.assistant1 {
                    committee.assistant1 = if first.is_empty() { None } else { Some(first) };
                }
                if let Some(second) = update.assistant2 {
                    committee.assistant2 = if second.is_empty() { None } else { Some(second) };
                }
                true
            }
            None => false,
        }
    }

    // --- schedule ---

    pub fn update_day(&mut self, day_id: &str, update: DayUpdate) -> bool {
        match self.schedule.iter_mut().find(|d| d.id == day_id) {
            Some(day) => {
                if let Some(date) = update.date {
                    if let Some(weekday) = weekday_name(&date) {
                        day.day_of_week = weekday;
                    }
                    day.date = date;
                }
                if let Some(day_of_week) = update.day_of_week {
                    day.day_of_week = day_of_week;
                }
                if let Some(s) = update.subject_10 {
                    day.subject_10 = s;
                }
                if let Some(s) = update.subject_11_sci {
                    day.subject_11_sci = s;
                }
                if let Some(s) = update.subject_11_arts {
                    day.subject_11_arts = s;
                }
                if let Some(s) = update.subject_12_sci {
                    day.subject_12_sci = s;
                }
                if let Some(s) = update.subject_12_arts {
                    day.subject_12_arts = s;
                }
                true
            }
            None => false,
        }
    }

    // --- daily absence and pins ---

    /// Flips one observer's absence for one day; returns the new state.
    pub fn toggle_absence(&mut self, day_id: &str, observer_id: &str) -> bool {
        let day_set = self.absence.entry(day_id.to_string()).or_default();
        if day_set.remove(observer_id) {
            false
        } else {
            day_set.insert(observer_id.to_string());
            true
        }
    }

    /// Saves a manual placement for one proctor on one day.
    ///
    /// The seat must exist and may hold at most two pinned observers.
    /// These checks run only here; later committee edits can leave a pin
    /// stale, which the engine resolves by sweeping it into reserves.
    pub fn set_pin(
        &mut self,
        day_id: &str,
        observer_id: &str,
        seat: PinnedSeat,
    ) -> Result<(), String> {
        let observer = self
            .observers
            .iter()
            .find(|o| o.id == observer_id)
            .ok_or_else(|| "Unknown observer".to_string())?;
        if observer.role != ObserverRole::Proctor {
            return Err("Only proctors can be pinned to a room".to_string());
        }

        let committee = self
            .committees
            .iter()
            .find(|c| c.id == seat.committee_id)
            .ok_or_else(|| "Unknown committee".to_string())?;
        if seat.sub_committee < 1 || seat.sub_committee > committee.sub_committees {
            return Err(format!(
                "{} has only {} rooms",
                committee.name, committee.sub_committees
            ));
        }

        let day_pins = self.pins.entry(day_id.to_string()).or_default();
        let occupants = day_pins
            .iter()
            .filter(|(id, pinned)| id.as_str() != observer_id && **pinned == seat)
            .count();
        if occupants >= 2 {
            return Err(format!(
                "{} room {} already has 2 pinned observers",
                committee.name, seat.sub_committee
            ));
        }

        day_pins.insert(observer_id.to_string(), seat);
        Ok(())
    }

    pub fn clear_pin(&mut self, day_id: &str, observer_id: &str) -> bool {
        self.pins
            .get_mut(day_id)
            .map(|day_pins| day_pins.remove(observer_id).is_some())
            .unwrap_or(false)
    }

    // --- the daily run ---

    /// Runs the distribution for one day and freezes the result as that
    /// day's history entry, replacing any earlier entry. Returns the
    /// non-fatal staffing warning, if any.
    pub fn run_day<R: Rng>(&mut self, day_id: &str, rng: &mut R) -> Result<Option<String>, String> {
        if self.day(day_id).is_none() {
            return Err("Unknown exam day".to_string());
        }

        let empty_absent = Default::default();
        let empty_pins = Default::default();
        let absent = self.absence.get(day_id).unwrap_or(&empty_absent);
        let day_pins = self.pins.get(day_id).unwrap_or(&empty_pins);

        let dist = run_distribution(&self.observers, &self.committees, absent, day_pins, rng)?;

        self.history.insert(
            day_id.to_string(),
            DayRecord {
                rooms: dist.rooms,
                monitors: dist.monitors,
                reserves: dist.reserves,
                timestamp: Utc::now().timestamp_millis(),
            },
        );
        Ok(dist.warning)
    }

    // --- sample data ---

    /// Replaces master data with a generated sample and merges its
    /// schedule skeleton into the existing ten days by position.
    pub fn apply_sample(&mut self, sample: SampleData) {
        self.observers = sample.observers;
        self.committees = sample.committees;
        for (idx, generated) in sample.schedule.into_iter().enumerate() {
            if idx >= self.schedule.len() {
                break;
            }
            let day = &mut self.schedule[idx];
            day.subject_10 = generated.subject_10;
            day.subject_11_sci = generated.subject_11_sci;
            day.subject_11_arts = generated.subject_11_arts;
            day.subject_12_sci = generated.subject_12_sci;
            day.subject_12_arts = generated.subject_12_arts;
            day.date = generated.date;
            if !generated.day_of_week.is_empty() {
                day.day_of_week = generated.day_of_week;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn obs(id: &str, role: ObserverRole) -> Observer {
        Observer {
            id: id.to_string(),
            name: format!("Observer {}", id),
            department: None,
            role,
        }
    }

    fn committee(id: &str, rooms: u32) -> Committee {
        Committee {
            id: id.to_string(),
            name: format!("Committee {}", id),
            sub_committees: rooms,
            observers_per_room: 2,
            head_name: None,
            assistant1: None,
            assistant2: None,
        }
    }

    fn seat(committee: &str, room: u32) -> PinnedSeat {
        PinnedSeat {
            committee_id: committee.to_string(),
            sub_committee: room,
        }
    }

    fn populated_store() -> AppStore {
        let mut store = AppStore::default();
        store.add_observers(vec![
            obs("a", ObserverRole::Proctor),
            obs("b", ObserverRole::Proctor),
            obs("c", ObserverRole::Proctor),
            obs("m", ObserverRole::Monitor),
        ]);
        store.add_committee(committee("x", 2));
        store
    }

    #[test]
    fn pin_capacity_is_enforced_at_save_time() {
        let mut store = populated_store();
        store.set_pin("day-1", "a", seat("x", 1)).unwrap();
        store.set_pin("day-1", "b", seat("x", 1)).unwrap();

        let err = store.set_pin("day-1", "c", seat("x", 1)).unwrap_err();
        assert!(err.contains("already has 2"));

        // Re-saving an existing pin to the same seat is not a third occupant.
        store.set_pin("day-1", "b", seat("x", 1)).unwrap();
    }

    #[test]
    fn pins_are_rejected_for_non_proctors_and_bad_seats() {
        let mut store = populated_store();

        assert!(store.set_pin("day-1", "m", seat("x", 1)).is_err());
        assert!(store.set_pin("day-1", "ghost", seat("x", 1)).is_err());
        assert!(store.set_pin("day-1", "a", seat("nope", 1)).is_err());
        assert!(store.set_pin("day-1", "a", seat("x", 3)).is_err());
        assert!(store.set_pin("day-1", "a", seat("x", 0)).is_err());
    }

    #[test]
    fn clear_pin_removes_only_that_day() {
        let mut store = populated_store();
        store.set_pin("day-1", "a", seat("x", 1)).unwrap();
        store.set_pin("day-2", "a", seat("x", 2)).unwrap();

        assert!(store.clear_pin("day-1", "a"));
        assert!(!store.clear_pin("day-1", "a"));
        assert!(store.pins.get("day-2").unwrap().contains_key("a"));
    }

    #[test]
    fn absence_toggles_per_day() {
        let mut store = populated_store();
        assert!(store.toggle_absence("day-1", "a"));
        assert!(!store.toggle_absence("day-1", "a"));
        assert!(store.toggle_absence("day-2", "a"));
        assert!(store.absence.get("day-2").unwrap().contains("a"));
    }

    #[test]
    fn run_day_freezes_history_and_rerun_overwrites_only_that_day() {
        let mut store = populated_store();
        let mut rng = StdRng::seed_from_u64(1);

        store.run_day("day-1", &mut rng).unwrap();
        store.run_day("day-2", &mut rng).unwrap();
        let day2_stamp = store.history.get("day-2").unwrap().timestamp;

        // A rerun with different absence replaces day-1 but leaves day-2 alone.
        store.toggle_absence("day-1", "a");
        store.run_day("day-1", &mut rng).unwrap();

        let day1 = store.history.get("day-1").unwrap();
        assert!(day1
            .rooms
            .iter()
            .all(|room| room.observers.iter().all(|o| o.id != "a")));
        assert_eq!(store.history.get("day-2").unwrap().timestamp, day2_stamp);
    }

    #[test]
    fn run_day_rejects_unknown_days_and_empty_inputs() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut store = populated_store();
        assert!(store.run_day("day-99", &mut rng).is_err());

        let mut empty = AppStore::default();
        assert!(empty.run_day("day-1", &mut rng).is_err());
        assert!(empty.history.is_empty());
    }

    #[test]
    fn observation_counts_follow_room_placements() {
        let mut store = populated_store();
        let mut rng = StdRng::seed_from_u64(3);
        store.run_day("day-1", &mut rng).unwrap();
        store.run_day("day-2", &mut rng).unwrap();

        // Three proctors, four seats per day: everyone sits both days.
        assert_eq!(store.observation_count("a"), 2);
        assert_eq!(store.observation_count("m"), 0, "monitors never sit in rooms");
        assert_eq!(store.observation_count("ghost"), 0);
    }

    #[test]
    fn snapshot_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = populated_store();
        store.toggle_absence("day-3", "b");
        store.set_pin("day-3", "a", seat("x", 2)).unwrap();
        store.save(&path).unwrap();

        let loaded = AppStore::load(&path);
        assert_eq!(loaded.observers.len(), 4);
        assert_eq!(loaded.committees.len(), 1);
        assert!(loaded.absence.get("day-3").unwrap().contains("b"));
        assert_eq!(
            loaded.pins.get("day-3").unwrap().get("a"),
            Some(&seat("x", 2))
        );
    }

    #[test]
    fn corrupt_snapshot_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ this is not json").unwrap();

        let store = AppStore::load(&path);
        assert!(store.observers.is_empty());
        assert_eq!(store.schedule.len(), 10);
    }

    #[test]
    fn missing_snapshot_gives_a_fresh_schedule() {
        let store = AppStore::load("/nonexistent/observer_data.json");
        assert_eq!(store.schedule.len(), 10);
        assert_eq!(store.schedule[0].id, "day-1");
    }

    #[test]
    fn setting_a_date_derives_the_weekday() {
        let mut store = AppStore::default();
        let update = DayUpdate {
            date: Some("2026-03-16".to_string()),
            ..Default::default()
        };
        assert!(store.update_day("day-1", update));
        assert_eq!(store.day("day-1").unwrap().day_of_week, "Monday");

        // An explicit weekday in the same update wins over the derived one.
        let update = DayUpdate {
            date: Some("2026-03-16".to_string()),
            day_of_week: Some("Holiday".to_string()),
            ..Default::default()
        };
        store.update_day("day-2", update);
        assert_eq!(store.day("day-2").unwrap().day_of_week, "Holiday");
    }
}
