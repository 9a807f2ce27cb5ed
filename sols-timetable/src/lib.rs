//! Turns a UOW SOLS "My Timetable" page into an iCalendar file.
//!
//! Classes are listed per academic week ("Weeks: 1-6,8-13"), so every row is
//! expanded into concrete dates using an [`AcademicCalendar`] that knows when
//! each semester starts and where its recess weeks fall.

mod calendar;
mod error;
mod occurrence;
mod parser;
mod structs;
mod weeks;

#[cfg(feature = "ics")]
mod ics;

pub use calendar::{AcademicCalendar, Recess, SemesterCalendar, YearCalendar, ANNUAL_AUTUMN_WEEKS};
pub use error::{Error, Result};
pub use parser::parse_timetable;
pub use structs::{ClassEvent, Occurrence, ParseSessionError, Semester, Session, Timetable};
pub use weeks::{expand_weeks, week_tokens, MAX_WEEK};

#[cfg(feature = "ics")]
pub use crate::ics::{generate_ics, render, CALENDAR_NAME, FILENAME, PRODID, TZID};
