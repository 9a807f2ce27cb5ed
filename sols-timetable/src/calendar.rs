//! Academic calendar configuration and week-to-date resolution.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use serde::Deserialize;

use crate::{Error, Result, Semester, Session};

/// Number of teaching weeks an annual subject spends in autumn before its
/// week numbers continue into spring (annual week 14 is spring week 1).
pub const ANNUAL_AUTUMN_WEEKS: u32 = 13;

static EMBEDDED: &str = include_str!("../calendars/uow.toml");

/// Per-year semester anchors, keyed by calendar year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcademicCalendar {
    years: BTreeMap<i32, YearCalendar>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct YearCalendar {
    pub autumn: Option<SemesterCalendar>,
    pub spring: Option<SemesterCalendar>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SemesterCalendar {
    /// Monday of teaching week 1.
    pub week1_monday: NaiveDate,
    /// Recesses, ordered by `after_week`.
    #[serde(default)]
    pub breaks: Vec<Recess>,
}

/// A teaching-free gap of `duration_weeks` inserted after week `after_week`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Recess {
    pub after_week: u32,
    pub duration_weeks: u32,
}

#[derive(Deserialize)]
struct CalendarFile {
    #[serde(default, rename = "year")]
    years: Vec<YearEntry>,
}

#[derive(Deserialize)]
struct YearEntry {
    year: i32,
    #[serde(flatten)]
    semesters: YearCalendar,
}

impl AcademicCalendar {
    /// The calendar shipped with the crate.
    pub fn embedded() -> Result<Self> {
        Self::from_toml(EMBEDDED)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_toml(fs::read_to_string(path)?)
    }

    pub fn from_toml<S: AsRef<str>>(s: S) -> Result<Self> {
        let file: CalendarFile = toml::from_str(s.as_ref())?;
        let mut calendar = AcademicCalendar::default();

        for entry in file.years {
            for (semester, config) in entry.semesters.iter() {
                config.validate().map_err(|reason| {
                    Error::InvalidCalendar(format!("{semester} {}: {reason}", entry.year))
                })?;
            }

            if calendar.years.insert(entry.year, entry.semesters).is_some() {
                return Err(Error::InvalidCalendar(format!(
                    "year {} is configured more than once",
                    entry.year
                )));
            }
        }

        Ok(calendar)
    }

    pub fn insert(&mut self, year: i32, config: YearCalendar) -> Option<YearCalendar> {
        self.years.insert(year, config)
    }

    pub fn year(&self, year: i32) -> Option<&YearCalendar> {
        self.years.get(&year)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    /// Returns the Monday of academic `week` of `session` in `year`.
    pub fn week_monday(&self, session: Session, week: u32, year: i32) -> Result<NaiveDate> {
        if week == 0 {
            return Err(Error::InvalidWeek { week });
        }

        let (semester, week) = session.semester_week(week);

        let config = self
            .years
            .get(&year)
            .ok_or(Error::ConfigNotFound { year })?
            .semester(semester)
            .ok_or(Error::SessionNotFound { semester, year })?;

        config.week_monday(week)
    }
}

impl YearCalendar {
    pub fn semester(&self, semester: Semester) -> Option<&SemesterCalendar> {
        match semester {
            Semester::Autumn => self.autumn.as_ref(),
            Semester::Spring => self.spring.as_ref(),
        }
    }

    fn iter(&self) -> impl Iterator<Item = (Semester, &SemesterCalendar)> {
        [Semester::Autumn, Semester::Spring]
            .into_iter()
            .filter_map(|semester| Some((semester, self.semester(semester)?)))
    }
}

impl SemesterCalendar {
    /// Whole weeks between week 1 and `week`, recesses included. Every recess
    /// is tested against `week` itself, never against a shifted week number.
    ///
    /// Returns `None` if the offset does not fit in a `u32`.
    pub fn offset_weeks(&self, week: u32) -> Option<u32> {
        self.breaks
            .iter()
            .filter(|recess| week > recess.after_week)
            .try_fold(week.saturating_sub(1), |offset, recess| {
                offset.checked_add(recess.duration_weeks)
            })
    }

    pub fn week_monday(&self, week: u32) -> Result<NaiveDate> {
        if week == 0 {
            return Err(Error::InvalidWeek { week });
        }

        self.offset_weeks(week)
            .and_then(|offset| Duration::try_weeks(i64::from(offset)))
            .and_then(|offset| self.week1_monday.checked_add_signed(offset))
            .ok_or(Error::DateOutOfRange { week })
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let mut previous: Option<u32> = None;

        for recess in &self.breaks {
            if recess.after_week == 0 {
                return Err("breaks must follow a week numbered 1 or higher".into());
            }

            if recess.duration_weeks == 0 {
                return Err(format!(
                    "break after week {} must last at least one week",
                    recess.after_week
                ));
            }

            if previous.is_some_and(|previous| recess.after_week <= previous) {
                return Err(format!(
                    "break after week {} is out of order or duplicated",
                    recess.after_week
                ));
            }

            previous = Some(recess.after_week);
        }

        Ok(())
    }
}

impl Session {
    /// Maps an academic week of this session onto a semester and the week
    /// number within it.
    pub fn semester_week(self, week: u32) -> (Semester, u32) {
        match self {
            Session::Autumn => (Semester::Autumn, week),
            Session::Spring => (Semester::Spring, week),
            Session::Annual if week <= ANNUAL_AUTUMN_WEEKS => (Semester::Autumn, week),
            Session::Annual => (Semester::Spring, week - ANNUAL_AUTUMN_WEEKS),
        }
    }
}
