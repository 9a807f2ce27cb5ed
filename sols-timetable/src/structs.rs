use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Every class found on a "My Timetable" page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timetable {
    pub events: Vec<ClassEvent>,
}

/// One row of the timetable. A single row usually stands for many classes,
/// one per week listed in `weeks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassEvent {
    /// Enrolment kind as shown on the page, e.g. "Lecture" or "Enrolled".
    #[serde(rename = "type")]
    pub kind: String,
    pub subject_code: String,
    pub activity_type: String,
    #[serde(default)]
    pub activity_detail: String,
    #[serde(serialize_with = "serialize_weekday", deserialize_with = "deserialize_weekday")]
    pub day: Weekday,
    #[serde(
        rename = "startTime",
        serialize_with = "serialize_naive_time",
        deserialize_with = "deserialize_naive_time"
    )]
    pub start: NaiveTime,
    #[serde(
        rename = "endTime",
        serialize_with = "serialize_naive_time",
        deserialize_with = "deserialize_naive_time"
    )]
    pub end: NaiveTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Raw week specification, e.g. "1-6,8-13".
    pub weeks: String,
    pub session: Session,
}

/// A single class on a concrete date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub week: u32,
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// The teaching session a subject is offered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Session {
    Autumn,
    Spring,
    /// Runs across both semesters.
    Annual,
}

/// A semester with its own entry in the academic calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Semester {
    Autumn,
    Spring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSessionError(String);

impl fmt::Display for ParseSessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown session `{}`", self.0)
    }
}

impl std::error::Error for ParseSessionError {}

impl FromStr for Session {
    type Err = ParseSessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "autumn" => Ok(Session::Autumn),
            "spring" => Ok(Session::Spring),
            "annual" => Ok(Session::Annual),
            _ => Err(ParseSessionError(s.to_string())),
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Session::Autumn => "Autumn",
            Session::Spring => "Spring",
            Session::Annual => "Annual",
        })
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Semester::Autumn => "autumn",
            Semester::Spring => "spring",
        })
    }
}

impl Serialize for Session {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Session {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

fn serialize_naive_time<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    let formatted_time = format!("{:02}:{:02}", time.hour(), time.minute());
    serializer.serialize_str(&formatted_time)
}

fn deserialize_naive_time<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|err| de::Error::custom(format!("invalid time `{raw}`: {err}")))
}

fn serialize_weekday<S: Serializer>(day: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(day)
}

fn deserialize_weekday<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Weekday, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.trim()
        .parse()
        .map_err(|_| de::Error::custom(format!("invalid day `{raw}`")))
}
