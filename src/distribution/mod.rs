pub mod engine;
pub mod shuffle;
pub mod types;

pub use engine::{run_distribution, Distribution};
pub use shuffle::fisher_yates;
pub use types::{
    weekday_name, AbsenceMap, Committee, DayRecord, ExamDay, HistoryMap, Observer, ObserverRole,
    PinMap, PinnedSeat, RoomAssignment,
};
