use std::io;

use thiserror::Error;

use crate::Semester;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No calendar config for year {year}")]
    ConfigNotFound { year: i32 },

    #[error("No calendar config for {semester} {year}")]
    SessionNotFound { semester: Semester, year: i32 },

    #[error("Week {week} is not a valid academic week")]
    InvalidWeek { week: u32 },

    #[error("Week {week} falls outside the representable date range")]
    DateOutOfRange { week: u32 },

    #[error("Malformed week specification `{token}`")]
    MalformedWeekSpec { token: String },

    #[error("Invalid academic calendar: {0}")]
    InvalidCalendar(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse academic calendar: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
