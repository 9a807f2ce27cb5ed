use chrono::Days;
use log::warn;

use crate::{week_tokens, AcademicCalendar, ClassEvent, Error, Occurrence, Result};

impl ClassEvent {
    /// Places this class in academic `week` of `year`.
    pub fn occurrence(&self, calendar: &AcademicCalendar, year: i32, week: u32) -> Result<Occurrence> {
        let monday = calendar.week_monday(self.session, week, year)?;

        let date = monday
            .checked_add_days(Days::new(u64::from(self.day.num_days_from_monday())))
            .ok_or(Error::DateOutOfRange { week })?;

        Ok(Occurrence {
            week,
            date,
            start: date.and_time(self.start),
            end: date.and_time(self.end),
        })
    }

    /// Every occurrence of this class in `year`. Weeks that cannot be placed
    /// are logged and left out.
    pub fn occurrences(&self, calendar: &AcademicCalendar, year: i32) -> Vec<Occurrence> {
        let mut occurrences = Vec::new();

        for token in week_tokens(&self.weeks) {
            let weeks = match token {
                Ok(weeks) => weeks,
                Err(err) => {
                    warn!("Skipping weeks of {}: {err}", self.subject_code);
                    continue;
                }
            };

            for week in weeks {
                match self.occurrence(calendar, year, week) {
                    Ok(occurrence) => occurrences.push(occurrence),
                    Err(err) => warn!("Skipping week {week} for {}: {err}", self.subject_code),
                }
            }
        }

        occurrences
    }
}
