use chrono::{NaiveTime, Weekday};
use log::debug;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::{ClassEvent, Session, Timetable};

macro_rules! selector {
    ($query:expr) => {{
        static SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse($query).unwrap());
        &SELECTOR
    }};
}

const DAYS: [(&str, Weekday); 7] = [
    ("Monday", Weekday::Mon),
    ("Tuesday", Weekday::Tue),
    ("Wednesday", Weekday::Wed),
    ("Thursday", Weekday::Thu),
    ("Friday", Weekday::Fri),
    ("Saturday", Weekday::Sat),
    ("Sunday", Weekday::Sun),
];

/// Extracts the classes listed in the mobile view of a "My Timetable" page.
/// Entries that cannot be fully parsed are dropped.
pub fn parse_timetable<S: AsRef<str>>(s: S) -> Timetable {
    let html = Html::parse_document(s.as_ref());

    let session_cells = html
        .select(selector!(
            "#desktop-version .timetable td.lecture, #desktop-version .timetable td.enrolled"
        ))
        .map(|cell| cell.text().collect::<String>())
        .collect::<Vec<_>>();

    let mut events = Vec::new();
    let mut current_day = None;

    for item in html.select(selector!("#mobile-version .list-group-item")) {
        let Some(heading) = item
            .select(selector!("h4.list-group-item-heading"))
            .next()
        else {
            continue;
        };

        let heading = heading.text().collect::<String>();
        let heading = heading.trim();

        if is_day_header(item) {
            if let Some(day) = parse_day_name(heading) {
                current_day = Some(day);
                continue;
            }
        }

        let Some(day) = current_day else {
            continue;
        };

        match parse_class(item, heading, day, &session_cells) {
            Some(event) => events.push(event),
            None => debug!("Discarding timetable entry `{heading}`"),
        }
    }

    Timetable { events }
}

fn is_day_header(item: ElementRef) -> bool {
    item.value()
        .attr("style")
        .is_some_and(|style| style.contains("background"))
}

fn parse_day_name(heading: &str) -> Option<Weekday> {
    DAYS.iter()
        .find(|(name, _)| *name == heading)
        .map(|(_, day)| *day)
}

fn parse_class(
    item: ElementRef,
    heading: &str,
    day: Weekday,
    session_cells: &[String],
) -> Option<ClassEvent> {
    let (kind, subject_code) = parse_heading(heading)?;

    let content = item
        .select(selector!("p.list-group-item-text"))
        .next()?
        .text()
        .collect::<String>();

    let time_at = content.find("Time:")?;

    let activity_detail = match content[..time_at].trim() {
        "" => kind.to_string(),
        detail => detail.to_string(),
    };

    let (start, end) = parse_times(&content[time_at + "Time:".len()..])?;

    let location = field(&content, "Location:")
        .map(|location| match location.find("Weeks:") {
            Some(end) => &location[..end],
            None => location,
        })
        .map(str::trim)
        .filter(|location| !location.is_empty())
        .map(str::to_string);

    let weeks = field(&content, "Weeks:")?
        .lines()
        .next()?
        .trim()
        .to_string();

    if weeks.is_empty() {
        return None;
    }

    Some(ClassEvent {
        kind: kind.to_string(),
        subject_code: subject_code.to_string(),
        activity_type: simplify_activity(&activity_detail).to_string(),
        activity_detail,
        day,
        start,
        end,
        location,
        weeks,
        session: detect_session(session_cells, subject_code),
    })
}

/// Splits `Lecture - CSIT242` into its enrolment kind and subject code.
fn parse_heading(heading: &str) -> Option<(&str, &str)> {
    let (kind, rest) = heading.split_once('-')?;
    let kind = kind.trim_end();

    if !kind.eq_ignore_ascii_case("lecture") && !kind.eq_ignore_ascii_case("enrolled") {
        return None;
    }

    let rest = rest.trim_start();
    let code_len = rest
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());

    (code_len > 0).then(|| (kind, &rest[..code_len]))
}

/// Parses ` Mon, 11:30 - 13:30...` into start and end times.
fn parse_times(s: &str) -> Option<(NaiveTime, NaiveTime)> {
    let (_, times) = s.split_once(',')?;
    let (start, rest) = times.split_once('-')?;

    let rest = rest.trim_start();
    let end_len = rest
        .find(|c: char| !(c.is_ascii_digit() || c == ':'))
        .unwrap_or(rest.len());

    let start = NaiveTime::parse_from_str(start.trim(), "%H:%M").ok()?;
    let end = NaiveTime::parse_from_str(&rest[..end_len], "%H:%M").ok()?;

    Some((start, end))
}

fn field<'a>(content: &'a str, label: &str) -> Option<&'a str> {
    content
        .find(label)
        .map(|at| content[at + label.len()..].trim_start())
}

fn simplify_activity(detail: &str) -> &'static str {
    let detail = detail.to_lowercase();

    if detail.starts_with("lecture") {
        "Lecture"
    } else if detail.contains("computer lab") {
        "Computer Lab"
    } else if detail.starts_with("wksp") {
        "Workshop"
    } else if detail.starts_with("tutorial") {
        "Tutorial"
    } else if detail.starts_with("seminar") {
        "Seminar"
    } else {
        "Class"
    }
}

/// Looks the subject up in the desktop table, which is the only place the
/// page names its session.
fn detect_session(session_cells: &[String], subject_code: &str) -> Session {
    session_cells
        .iter()
        .filter(|text| text.contains(subject_code))
        .find_map(|text| {
            let text = text.to_lowercase();

            if text.contains("annual") {
                Some(Session::Annual)
            } else if text.contains("spring") {
                Some(Session::Spring)
            } else if text.contains("autumn") {
                Some(Session::Autumn)
            } else {
                None
            }
        })
        .unwrap_or_else(|| {
            debug!("No session found for {subject_code}, assuming Autumn");
            Session::Autumn
        })
}
