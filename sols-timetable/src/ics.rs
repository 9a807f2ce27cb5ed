use chrono::{DateTime, Utc};
use ics::{
    components::Property,
    escape_text,
    parameters::TzIDParam,
    properties::{
        CalScale, Description, DtEnd, DtStart, Location, Method, RRule, Summary, TzName,
    },
    Daylight, ICalendar, Standard, TimeZone,
};
use uuid::Uuid;

use crate::{AcademicCalendar, ClassEvent, Occurrence, Timetable};

pub const TZID: &str = "Australia/Sydney";
pub const PRODID: &str = "-//SOLS Timetable to ICS//EN";
pub const CALENDAR_NAME: &str = "UOW Timetable";
/// Suggested name for the downloaded calendar file.
pub const FILENAME: &str = "UOW_class_timetable.ics";

const UID_DOMAIN: &str = "sols-cal";
const LOCAL_FORMAT: &str = "%Y%m%dT%H%M%S";
const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Maximum octets per physical line, continuation space included.
const LINE_LIMIT: usize = 75;
const LINE_BREAK: &str = "\r\n";
const FOLD: &str = "\r\n ";

/// Renders `events` for `year` as a complete iCalendar document.
///
/// Weeks that cannot be placed in the academic calendar are logged and
/// skipped; the remaining classes are still exported.
pub fn generate_ics(events: &[ClassEvent], calendar: &AcademicCalendar, year: i32) -> String {
    render(&build_calendar(events, calendar, year, Utc::now()))
}

/// Serializes `icalendar` with every physical line at most 75 octets long.
///
/// The `ics` writer lets continuation lines reach 76 octets, so its output is
/// unfolded and folded again. Property values are escaped and never contain a
/// raw line break, so every `CRLF SPACE` in the writer's output is a fold.
pub fn render(icalendar: &ICalendar<'_>) -> String {
    let unfolded = icalendar.to_string().replace(FOLD, "");
    let mut folded = String::with_capacity(unfolded.len() + unfolded.len() / 24);

    for line in unfolded.split_terminator(LINE_BREAK) {
        fold_line(&mut folded, line);
        folded.push_str(LINE_BREAK);
    }

    folded
}

fn fold_line(out: &mut String, mut line: &str) {
    let mut limit = LINE_LIMIT;

    loop {
        let end = fold_boundary(line, limit);
        out.push_str(&line[..end]);
        line = &line[end..];

        if line.is_empty() {
            return;
        }

        out.push_str(FOLD);
        limit = LINE_LIMIT - 1;
    }
}

fn fold_boundary(line: &str, limit: usize) -> usize {
    if line.len() <= limit {
        return line.len();
    }

    let mut end = limit;
    while !line.is_char_boundary(end) {
        end -= 1;
    }

    end
}

impl Timetable {
    /// Builds the calendar with a fixed DTSTAMP. Serialize it with [`render`].
    #[must_use]
    pub fn to_ics(
        &self,
        calendar: &AcademicCalendar,
        year: i32,
        dtstamp: DateTime<Utc>,
    ) -> ICalendar<'_> {
        build_calendar(&self.events, calendar, year, dtstamp)
    }
}

impl ClassEvent {
    /// The VEVENT for one occurrence of this class.
    #[must_use]
    pub fn to_ics(&self, occurrence: &Occurrence, dtstamp: DateTime<Utc>) -> ics::Event<'_> {
        let uid = format!("{}@{UID_DOMAIN}", Uuid::new_v4());
        let mut ics_event = ics::Event::new(uid, dtstamp.format(UTC_FORMAT).to_string());

        let mut start = DtStart::new(occurrence.start.format(LOCAL_FORMAT).to_string());
        start.add(TzIDParam::new(TZID));
        ics_event.push(start);

        let mut end = DtEnd::new(occurrence.end.format(LOCAL_FORMAT).to_string());
        end.add(TzIDParam::new(TZID));
        ics_event.push(end);

        ics_event.push(Summary::new(escape_text(format!(
            "{} {}",
            self.subject_code, self.activity_type
        ))));

        if let Some(location) = self.location.as_deref().filter(|l| !l.trim().is_empty()) {
            ics_event.push(Location::new(escape_text(location)));
        }

        let detail = if self.activity_detail.trim().is_empty() {
            &self.activity_type
        } else {
            &self.activity_detail
        };

        // Literal `\n` escapes; each part is escaped on its own first.
        ics_event.push(Description::new(format!(
            "{} - {}\\n{}\\nWeek {}",
            escape_text(self.kind.as_str()),
            escape_text(self.subject_code.as_str()),
            escape_text(detail.as_str()),
            occurrence.week
        )));

        ics_event
    }
}

fn build_calendar<'a>(
    events: &'a [ClassEvent],
    calendar: &AcademicCalendar,
    year: i32,
    dtstamp: DateTime<Utc>,
) -> ICalendar<'a> {
    let mut icalendar = ICalendar::new("2.0", PRODID);
    icalendar.push(CalScale::new("GREGORIAN"));
    icalendar.push(Method::new("PUBLISH"));
    icalendar.push(Property::new("X-WR-CALNAME", CALENDAR_NAME));
    icalendar.push(Property::new("X-WR-TIMEZONE", TZID));
    icalendar.add_timezone(sydney_timezone());

    for event in events {
        for occurrence in event.occurrences(calendar, year) {
            icalendar.add_event(event.to_ics(&occurrence, dtstamp));
        }
    }

    icalendar
}

fn sydney_timezone() -> TimeZone<'static> {
    let mut aest_standard = Standard::new("19700405T030000", "+1100", "+1000");
    aest_standard.push(TzName::new("AEST"));
    aest_standard.push(RRule::new("FREQ=YEARLY;BYMONTH=4;BYDAY=1SU"));

    let mut aedt_daylight = Daylight::new("19701004T020000", "+1000", "+1100");
    aedt_daylight.push(TzName::new("AEDT"));
    aedt_daylight.push(RRule::new("FREQ=YEARLY;BYMONTH=10;BYDAY=1SU"));

    let mut timezone = TimeZone::standard(TZID, aest_standard);
    timezone.add_daylight(aedt_daylight);

    timezone
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, TimeZone as _, Weekday};

    use super::*;
    use crate::Session;

    fn frozen_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 20, 8, 15, 0).unwrap()
    }

    fn lecture(weeks: &str) -> ClassEvent {
        ClassEvent {
            kind: "Lecture".to_string(),
            subject_code: "CSIT242".to_string(),
            activity_type: "Lecture".to_string(),
            activity_detail: "Lecture".to_string(),
            day: Weekday::Mon,
            start: NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
            end: NaiveTime::from_hms_opt(13, 30, 0).unwrap(),
            location: Some("25-107".to_string()),
            weeks: weeks.to_string(),
            session: Session::Autumn,
        }
    }

    fn export(events: Vec<ClassEvent>) -> String {
        let calendar = AcademicCalendar::embedded().unwrap();
        let timetable = Timetable { events };

        render(&timetable.to_ics(&calendar, 2026, frozen_clock()))
    }

    fn event_count(ics: &str) -> usize {
        ics.matches("BEGIN:VEVENT\r\n").count()
    }

    #[test]
    fn document_has_header_and_timezone() {
        let ics = export(vec![]);

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ics.trim_end().ends_with("END:VCALENDAR"));
        assert!(ics.contains("VERSION:2.0\r\n"));
        assert!(ics.contains("PRODID:-//SOLS Timetable to ICS//EN\r\n"));
        assert!(ics.contains("CALSCALE:GREGORIAN\r\n"));
        assert!(ics.contains("METHOD:PUBLISH\r\n"));
        assert!(ics.contains("X-WR-CALNAME:UOW Timetable\r\n"));
        assert!(ics.contains("X-WR-TIMEZONE:Australia/Sydney\r\n"));
        assert!(ics.contains("BEGIN:VTIMEZONE\r\n"));
        assert!(ics.contains("TZID:Australia/Sydney\r\n"));
        assert!(ics.contains("RRULE:FREQ=YEARLY;BYMONTH=4;BYDAY=1SU\r\n"));
        assert!(ics.contains("RRULE:FREQ=YEARLY;BYMONTH=10;BYDAY=1SU\r\n"));
        assert!(ics.contains("TZNAME:AEST\r\n"));
        assert!(ics.contains("TZNAME:AEDT\r\n"));
        assert_eq!(event_count(&ics), 0);
        assert!(!ics.replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn one_vevent_per_week() {
        let ics = export(vec![lecture("1-3,8")]);

        assert_eq!(event_count(&ics), 4);
        assert!(ics.contains("DTSTART;TZID=Australia/Sydney:20260302T113000\r\n"));
        assert!(ics.contains("DTEND;TZID=Australia/Sydney:20260302T133000\r\n"));
        assert!(ics.contains("DTSTART;TZID=Australia/Sydney:20260427T113000\r\n"));
        assert!(ics.contains("SUMMARY:CSIT242 Lecture\r\n"));
        assert!(ics.contains("LOCATION:25-107\r\n"));
        assert!(ics.contains("DESCRIPTION:Lecture - CSIT242\\nLecture\\nWeek 8\r\n"));
        assert_eq!(ics.matches("DTSTAMP:20260220T081500Z\r\n").count(), 4);
    }

    #[test]
    fn uids_are_random_v4_with_domain() {
        let ics = export(vec![lecture("1-2")]);
        let uids = ics
            .lines()
            .filter_map(|line| line.strip_prefix("UID:"))
            .collect::<Vec<_>>();

        assert_eq!(uids.len(), 2);
        assert_ne!(uids[0], uids[1]);

        for uid in uids {
            let uuid = uid.strip_suffix("@sols-cal").unwrap();
            assert_eq!(Uuid::parse_str(uuid).unwrap().get_version_num(), 4);
        }
    }

    #[test]
    fn empty_location_is_omitted() {
        let mut event = lecture("1");
        event.location = Some(String::new());
        event.activity_detail = String::new();

        let ics = export(vec![event]);

        assert!(!ics.contains("LOCATION"));
        assert!(ics.contains("DESCRIPTION:Lecture - CSIT242\\nLecture\\nWeek 1\r\n"));
    }

    #[test]
    fn long_lines_are_folded() {
        let mut event = lecture("1");
        let location = "Building 67 Room 202 Innovation Campus Squires Way North Wollongong \
                        Enter via the southern courtyard and take the lift to level two";
        event.location = Some(location.to_string());

        let ics = export(vec![event]);

        for line in ics.split("\r\n") {
            assert!(line.len() <= 75, "line exceeds 75 octets: {line:?}");
        }

        let unfolded = ics.replace("\r\n ", "");
        assert!(unfolded.contains(&format!("LOCATION:{location}\r\n")));
    }

    #[test]
    fn very_long_lines_fold_within_limit() {
        let mut event = lecture("1");
        let location = format!("{}, Ngunnawal Rm 老虎 {}", "x".repeat(300), "é".repeat(120));
        event.location = Some(location.clone());

        let ics = export(vec![event]);

        let long = ics.split("\r\n").filter(|line| line.len() > 75).collect::<Vec<_>>();
        assert!(long.is_empty(), "lines over 75 octets: {long:?}");

        let continuations = ics.split("\r\n").filter(|line| line.starts_with(' ')).count();
        assert!(continuations >= 7);

        let unfolded = ics.replace("\r\n ", "");
        let escaped = location.replace(',', "\\,");
        assert!(unfolded.contains(&format!("LOCATION:{escaped}\r\n")));
    }

    #[test]
    fn short_lines_are_left_alone() {
        let calendar = AcademicCalendar::embedded().unwrap();
        let timetable = Timetable { events: vec![] };
        let icalendar = timetable.to_ics(&calendar, 2026, frozen_clock());

        assert_eq!(render(&icalendar), icalendar.to_string());
    }

    #[test]
    fn fold_boundaries_respect_characters() {
        let mut out = String::new();
        fold_line(&mut out, &format!("{}{}", "a".repeat(74), "é".repeat(40)));

        let lines = out.split("\r\n").collect::<Vec<_>>();
        assert_eq!(lines[0], "a".repeat(74));
        assert_eq!(lines[1], format!(" {}", "é".repeat(37)));
        assert_eq!(lines[2], " ééé");
    }

    #[test]
    fn text_values_are_escaped() {
        let mut event = lecture("1");
        event.location = Some("Building 67, Room 202; Level 2".to_string());
        event.activity_detail = "Tutorial:T01, Group A".to_string();

        let ics = export(vec![event]);

        assert!(ics.contains("LOCATION:Building 67\\, Room 202\\; Level 2\r\n"));
        assert!(ics.contains("DESCRIPTION:Lecture - CSIT242\\nTutorial:T01\\, Group A\\nWeek 1\r\n"));
    }

    #[test]
    fn bad_weeks_do_not_abort_export() {
        let mut broken = lecture("0");
        broken.subject_code = "MATH101".to_string();

        let ics = export(vec![broken, lecture("1")]);

        assert_eq!(event_count(&ics), 1);
        assert!(ics.contains("SUMMARY:CSIT242 Lecture\r\n"));
        assert!(!ics.contains("MATH101"));
        assert_eq!(
            ics.matches("BEGIN:VEVENT").count(),
            ics.matches("END:VEVENT").count()
        );
    }

    #[test]
    fn output_is_stable_apart_from_uids() {
        let events = vec![lecture("1-13"), lecture("2,4")];
        let strip_uids = |ics: String| {
            ics.split("\r\n")
                .filter(|line| !line.starts_with("UID:"))
                .collect::<Vec<_>>()
                .join("\r\n")
        };

        assert_eq!(
            strip_uids(export(events.clone())),
            strip_uids(export(events))
        );
    }

    #[test]
    fn generate_ics_stamps_current_time() {
        let calendar = AcademicCalendar::embedded().unwrap();
        let ics = generate_ics(&[lecture("1")], &calendar, 2026);

        let stamp = ics
            .lines()
            .find_map(|line| line.strip_prefix("DTSTAMP:"))
            .unwrap();

        assert_eq!(stamp.len(), 16);
        assert!(stamp.ends_with('Z'));
        assert_eq!(event_count(&ics), 1);
    }
}
