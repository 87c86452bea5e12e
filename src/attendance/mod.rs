//! Attendance & shift computation: turns check-in/check-out events into
//! time-accounted daily records against each employee's weekly shift.

pub mod clock;
pub mod duration;
pub mod engine;
pub mod notifier;
pub mod query;
pub mod schedule;

pub use engine::{AttendanceEngine, CheckedOut};
pub use query::{AttendancePage, AttendanceQuery};
pub use schedule::{ShiftCache, ShiftResolver};
