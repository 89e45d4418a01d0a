//! Natural-language intent extractor
//!
//! Turns a free-text request such as `"họp 10 người 9h-11h ngày mai, 2 mic"`
//! into a [`Requirement`]. The text is normalised once, then each field is
//! read by its own ordered list of pattern matchers; the first matcher that
//! yields a valid value wins. Matchers never fail on their own. Only the
//! extractor raises, when the time window (or a syntactically valid but
//! impossible date) cannot be resolved.
//!
//! Vietnamese (with or without diacritics) and English vocabulary are both
//! recognised.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;
use utoipa::ToSchema;

use super::{IntentField, SchedulingError, SchedulingResult, TimeWindow};
use crate::models::DeviceCategory;

/// Structured requirement read from a request
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Requirement {
    pub attendees: Option<u32>,
    #[schema(value_type = String, example = "2026-01-28")]
    pub date: NaiveDate,
    pub window: TimeWindow,
    /// Required quantity per device category
    #[schema(value_type = Object, example = json!({"projector": 1, "microphone": 2}))]
    pub devices: IndexMap<DeviceCategory, u32>,
}

impl Requirement {
    pub fn duration(&self) -> Duration {
        self.window.duration()
    }
}

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

const NUMBER_WORDS: &[(&str, u32)] = &[
    ("một", 1),
    ("mot", 1),
    ("hai", 2),
    ("ba", 3),
    ("bốn", 4),
    ("bon", 4),
    ("năm", 5),
    ("nam", 5),
    ("sáu", 6),
    ("sau", 6),
    ("bảy", 7),
    ("bay", 7),
    ("tám", 8),
    ("tam", 8),
    ("chín", 9),
    ("chin", 9),
    ("mười", 10),
    ("muoi", 10),
    ("mười một", 11),
    ("muoi mot", 11),
    ("mười hai", 12),
    ("muoi hai", 12),
    ("mười ba", 13),
    ("mười bốn", 14),
    ("mười lăm", 15),
    ("muoi lam", 15),
    ("mười sáu", 16),
    ("mười bảy", 17),
    ("mười tám", 18),
    ("mười chín", 19),
    ("hai mươi", 20),
    ("hai muoi", 20),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
    ("twenty", 20),
];

const DEVICE_KEYWORDS: &[(DeviceCategory, &str)] = &[
    (DeviceCategory::Projector, r"máy\s*chiếu|may\s*chieu|projectors?"),
    (DeviceCategory::Microphone, r"microphones?|micro|mics?"),
    (DeviceCategory::Speaker, r"loa|speakers?|âm\s*ly|am\s*ly"),
    (
        DeviceCategory::AirConditioner,
        r"điều\s*hòa|điều\s*hoà|dieu\s*hoa|air\s*conditioners?|air\s*con|aircon",
    ),
    (
        DeviceCategory::Computer,
        r"máy\s*tính|may\s*tinh|laptops?|notebooks?|pcs?|computers?",
    ),
    (DeviceCategory::Other, r"tivi|tv|television"),
];

const ATTENDEE_UNITS: &str = r"người|nguoi|people|persons|pax";

const HINT_WORDS: &str =
    r"sáng|sang|trưa|trua|chiều|chieu|tối|toi|đêm|dem|morning|noon|afternoon|evening|night|tonight";

/// One clock reading: hour, then `:MM`, `hMM` or a bare `h`, then an optional
/// hour word or meridiem.
const CLOCK: &str = r"\d{1,2}(?:\s*:\s*\d{1,2}|\s*h(?:\d{1,2})?)?(?:\s*(?:giờ|gio|am|pm))?";

/// Alternation of spelled-out numbers, longest first
fn number_alternation() -> String {
    let mut words: Vec<&str> = NUMBER_WORDS.iter().map(|(w, _)| *w).collect();
    words.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    words
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|")
}

fn number_value(phrase: &str) -> Option<u32> {
    let phrase = WHITESPACE.replace_all(phrase.trim(), " ");
    NUMBER_WORDS
        .iter()
        .find(|(word, _)| *word == phrase)
        .map(|(_, value)| *value)
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("Invalid regex")
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

static WHITESPACE: Lazy<Regex> = Lazy::new(|| compile(r"\s+"));
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| compile(r"[,.;]+"));

static ATTENDEES_DIGITS: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"\b(?:(?:khoảng|khoang|tầm|about|around|approximately|approx)\s*)?(\d{{1,3}})\s*(?:{})\b",
        ATTENDEE_UNITS
    ))
});
static ATTENDEES_WORDS: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"\b({})\s+(?:{})\b",
        number_alternation(),
        ATTENDEE_UNITS
    ))
});

static TODAY: Lazy<Regex> = Lazy::new(|| compile(r"\b(?:hôm\s*nay|hom\s*nay|today)\b"));
static DAY_AFTER_TOMORROW: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:ngày\s*kia|ngay\s*kia|ngày\s*mốt|day\s+after\s+tomorrow)\b"));
static TOMORROW: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:ngày\s*mai|ngay\s*mai|mai|tomorrow)\b"));
static NUMERIC_DATE: Lazy<Regex> = Lazy::new(|| {
    compile(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{4}))?\b|\b(\d{1,2})-(\d{1,2})-(\d{4})\b")
});
static PROSE_DATE: Lazy<Regex> = Lazy::new(|| {
    compile(
        r"\b(?:ngày|ngay|day)\s*(\d{1,2})\s*(?:tháng|thang|month)\s*(\d{1,2})(?:\s*(?:năm|nam|year)\s*(\d{4}))?\b",
    )
});
static DAY_OF_MONTH: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:mùng|mung)\s*(\d{1,2})\b|\bthe\s+(\d{1,2})(?:st|nd|rd|th)\b"));
static WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    compile(
        r"\b(?:thứ|thu)\s*([2-7])\b|\b(?:thứ|thu)\s+(hai|ba|tư|tu|năm|nam|sáu|sau|bảy|bay)\b|\b(chủ\s*nhật|chu\s*nhat|cn|monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
    )
});

static SPACED_MINUTES: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(\d{1,2})\s*h\s+([0-5]\d)\b"));
// A number that is a headcount, a date or a device quantity, not minutes
static COUNT_OR_DATE_AFTER: Lazy<Regex> = Lazy::new(|| {
    let devices = DEVICE_KEYWORDS
        .iter()
        .map(|(_, keywords)| *keywords)
        .collect::<Vec<_>>()
        .join("|");
    compile(&format!(
        r"^\s*(?:/\d|-\d{{1,2}}-\d|(?:{}|cái|cai|chiếc|chiec)\b|(?:{})\b)",
        ATTENDEE_UNITS, devices
    ))
});
static HEADCOUNT_AFTER: Lazy<Regex> =
    Lazy::new(|| compile(&format!(r"^\s*(?:{})\b", ATTENDEE_UNITS)));

static TIME_MARKER: Lazy<Regex> = Lazy::new(|| compile(r"[:h]|giờ|gio|am|pm"));
static CLOCK_PARTS: Lazy<Regex> = Lazy::new(|| {
    compile(r"^(\d{1,2})(?:\s*:\s*(\d{1,2})|\s*h(\d{1,2})?)?(?:\s*(giờ|gio|am|pm))?$")
});
static DASH_RANGE: Lazy<Regex> =
    Lazy::new(|| compile(&format!(r"\b({c})\s*-\s*({c})\b", c = CLOCK)));
static FROM_TO_RANGE: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"\b(?:(?:từ|tu|from)\s+)?({c})\s+(?:đến|den|tới|to|until|till)\s+({c})\b",
        c = CLOCK
    ))
});

static HINT_ANY: Lazy<Regex> = Lazy::new(|| {
    compile(r"\b(sáng|trưa|chiều|tối|đêm|morning|noon|afternoon|evening|night|tonight)\b")
});
// Unaccented hints are common words too ("toi" is also "I"), so they only
// count next to an hour.
static HINT_NEAR_HOUR: Lazy<Regex> = Lazy::new(|| {
    compile(r"\b\d{1,2}\s*(?:giờ|gio|h)?\s*(sang|trua|chieu|toi|dem)\b|\b(sang|trua|chieu|toi|dem)\s*\d{1,2}\b")
});

static HALF_HOUR: Lazy<Regex> = Lazy::new(|| {
    compile(
        r"\b(\d{1,2})\s*(?:giờ|gio|h)?\s*(?:rưỡi|ruoi)\b|\b(\d{1,2})\s+and\s+a\s+half\b|\bhalf\s+past\s+(\d{1,2})\b",
    )
});
static HINTED_HOUR: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"\b(\d{{1,2}})\s*(?:giờ|gio|h)?\s*({h})\b|\b({h})\s*(\d{{1,2}})\b",
        h = HINT_WORDS
    ))
});
static COLON_TIME: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(\d{1,2})\s*:\s*(\d{1,2})(?:\s*(am|pm))?\b"));
static H_TIME: Lazy<Regex> = Lazy::new(|| compile(r"\b(\d{1,2})\s*h(\d{1,2})?\b"));
static HOUR_WORD_TIME: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(\d{1,2})\s*(?:giờ|gio|o'clock|oclock)\b"));
static MERIDIEM_TIME: Lazy<Regex> = Lazy::new(|| compile(r"\b(\d{1,2})\s*(am|pm)\b"));

static DEVICE_PATTERNS: Lazy<Vec<(DeviceCategory, Regex)>> = Lazy::new(|| {
    DEVICE_KEYWORDS
        .iter()
        .map(|(category, keywords)| (*category, compile(&format!(r"\b(?:{})\b", keywords))))
        .collect()
});
static QUANTITY_BEFORE: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"(?:^|\s)(\d{{1,3}}|{})\s*(?:(?:cái|cai|chiếc|chiec|con|x)\s*)?$",
        number_alternation()
    ))
});

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Lower-case, NFC, dash variants to `-`, `, . ;` to spaces, collapsed whitespace
pub fn normalize(text: &str) -> String {
    let lowered = text.nfc().collect::<String>().to_lowercase();
    let dashed = lowered
        .replace("->", "-")
        .replace(['–', '—', '−', '→'], "-");
    let spaced = PUNCTUATION.replace_all(&dashed, " ");
    WHITESPACE.replace_all(spaced.trim(), " ").into_owned()
}

/// "9h 30" reads as "9h30" unless the number belongs to something else
fn join_spaced_minutes(text: &str) -> String {
    SPACED_MINUTES
        .replace_all(text, |caps: &Captures| {
            let end = caps.get(0).map_or(text.len(), |m| m.end());
            if COUNT_OR_DATE_AFTER.is_match(&text[end..]) {
                caps[0].to_string()
            } else {
                format!("{}h{}", &caps[1], &caps[2])
            }
        })
        .into_owned()
}

/// True when the number ending at `end` counts people
fn headcount_at(text: &str, end: usize) -> bool {
    HEADCOUNT_AFTER.is_match(&text[end..])
}

fn number(caps: &Captures, index: usize) -> Option<u32> {
    caps.get(index)?.as_str().parse().ok()
}

/// The first numeric capture group that participated in the match
fn first_number(caps: &Captures) -> Option<u32> {
    caps.iter()
        .skip(1)
        .flatten()
        .find_map(|m| m.as_str().parse().ok())
}

fn first_valid<T>(pattern: &Regex, text: &str, read: impl Fn(&Captures) -> Option<T>) -> Option<T> {
    pattern.captures_iter(text).find_map(|caps| read(&caps))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DayPart {
    Morning,
    Noon,
    Afternoon,
    Evening,
    Night,
}

impl DayPart {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "sáng" | "sang" | "morning" => Some(DayPart::Morning),
            "trưa" | "trua" | "noon" => Some(DayPart::Noon),
            "chiều" | "chieu" | "afternoon" => Some(DayPart::Afternoon),
            "tối" | "toi" | "evening" | "tonight" => Some(DayPart::Evening),
            "đêm" | "dem" | "night" => Some(DayPart::Night),
            _ => None,
        }
    }

    /// 1–11 become afternoon hours, except in the morning
    fn apply(self, hour: u32) -> u32 {
        match self {
            DayPart::Morning => hour,
            DayPart::Noon | DayPart::Afternoon | DayPart::Evening | DayPart::Night => {
                if (1..=11).contains(&hour) {
                    hour + 12
                } else {
                    hour
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "am" => Some(Meridiem::Am),
            "pm" => Some(Meridiem::Pm),
            _ => None,
        }
    }
}

fn meridiem(caps: &Captures, index: usize) -> Option<Meridiem> {
    caps.get(index).and_then(|m| Meridiem::from_word(m.as_str()))
}

/// Resolve an hour against an explicit meridiem, else the day-part hint.
fn clock(hour: u32, minute: u32, meridiem: Option<Meridiem>, hint: Option<DayPart>) -> Option<NaiveTime> {
    let hour = match meridiem {
        Some(_) if hour > 12 => return None,
        Some(Meridiem::Pm) if hour < 12 => hour + 12,
        Some(Meridiem::Am) if hour == 12 => 0,
        Some(_) => hour,
        None => hint.map_or(hour, |h| h.apply(hour)),
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

#[derive(Debug, Clone, Copy)]
struct ClockToken {
    hour: u32,
    minute: u32,
    meridiem: Option<Meridiem>,
}

impl ClockToken {
    fn parse(token: &str) -> Option<Self> {
        let caps = CLOCK_PARTS.captures(token.trim())?;
        Some(Self {
            hour: number(&caps, 1)?,
            minute: number(&caps, 2).or_else(|| number(&caps, 3)).unwrap_or(0),
            meridiem: meridiem(&caps, 4),
        })
    }

    fn resolve(self, meridiem: Option<Meridiem>, hint: Option<DayPart>) -> Option<NaiveTime> {
        clock(self.hour, self.minute, meridiem, hint)
    }
}

fn parse_error(field: IntentField, message: impl Into<String>) -> SchedulingError {
    SchedulingError::Parse {
        field,
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Field matchers
// ---------------------------------------------------------------------------

fn parse_attendees(text: &str) -> Option<u32> {
    ATTENDEES_DIGITS
        .captures(text)
        .and_then(|caps| number(&caps, 1))
        .or_else(|| {
            ATTENDEES_WORDS
                .captures(text)
                .and_then(|caps| number_value(&caps[1]))
        })
        .filter(|n| *n > 0)
}

fn calendar_day(year: i32, month: Option<u32>, day: Option<u32>, matched: &str) -> SchedulingResult<NaiveDate> {
    month
        .zip(day)
        .and_then(|(m, d)| NaiveDate::from_ymd_opt(year, m, d))
        .ok_or_else(|| parse_error(IntentField::Date, format!("'{}' is not a calendar day", matched)))
}

fn weekday_from(caps: &Captures) -> Option<Weekday> {
    if let Some(n) = number(caps, 1) {
        return match n {
            2 => Some(Weekday::Mon),
            3 => Some(Weekday::Tue),
            4 => Some(Weekday::Wed),
            5 => Some(Weekday::Thu),
            6 => Some(Weekday::Fri),
            7 => Some(Weekday::Sat),
            _ => None,
        };
    }
    let word = caps.get(2).or_else(|| caps.get(3))?.as_str();
    let word = WHITESPACE.replace_all(word, " ");
    let weekday = match &*word {
        "hai" | "monday" => Weekday::Mon,
        "ba" | "tuesday" => Weekday::Tue,
        "tư" | "tu" | "wednesday" => Weekday::Wed,
        "năm" | "nam" | "thursday" => Weekday::Thu,
        "sáu" | "sau" | "friday" => Weekday::Fri,
        "bảy" | "bay" | "saturday" => Weekday::Sat,
        _ => Weekday::Sun,
    };
    Some(weekday)
}

/// Next occurrence strictly after `today`
fn next_weekday(today: NaiveDate, target: Weekday) -> NaiveDate {
    let ahead = (i64::from(target.num_days_from_monday())
        - i64::from(today.weekday().num_days_from_monday()))
    .rem_euclid(7);
    today + Duration::days(if ahead == 0 { 7 } else { ahead })
}

fn parse_date(text: &str, today: NaiveDate) -> SchedulingResult<Option<NaiveDate>> {
    if TODAY.is_match(text) {
        return Ok(Some(today));
    }
    if DAY_AFTER_TOMORROW.is_match(text) {
        return Ok(Some(today + Duration::days(2)));
    }
    if TOMORROW.is_match(text) {
        return Ok(Some(today + Duration::days(1)));
    }

    if let Some(caps) = NUMERIC_DATE.captures(text) {
        let (d, m, y) = if caps.get(1).is_some() { (1, 2, 3) } else { (4, 5, 6) };
        let year = number(&caps, y).map_or(today.year(), |y| y as i32);
        return calendar_day(year, number(&caps, m), number(&caps, d), &caps[0]).map(Some);
    }

    if let Some(caps) = PROSE_DATE.captures(text) {
        let year = number(&caps, 3).map_or(today.year(), |y| y as i32);
        return calendar_day(year, number(&caps, 2), number(&caps, 1), &caps[0]).map(Some);
    }

    if let Some(caps) = DAY_OF_MONTH.captures(text) {
        return calendar_day(today.year(), Some(today.month()), first_number(&caps), &caps[0])
            .map(Some);
    }

    Ok(WEEKDAY
        .captures(text)
        .and_then(|caps| weekday_from(&caps))
        .map(|weekday| next_weekday(today, weekday)))
}

fn detect_day_part(text: &str) -> Option<DayPart> {
    HINT_ANY
        .captures(text)
        .and_then(|caps| DayPart::from_word(&caps[1]))
        .or_else(|| {
            first_valid(&HINT_NEAR_HOUR, text, |caps| {
                let word = match caps.get(1) {
                    Some(word) => word,
                    None => {
                        let whole = caps.get(0)?;
                        if headcount_at(text, whole.end()) {
                            return None;
                        }
                        caps.get(2)?
                    }
                };
                DayPart::from_word(word.as_str())
            })
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeExpr {
    Range(NaiveTime, NaiveTime),
    Single(NaiveTime),
}

/// "1-3pm" is 13:00-15:00: a meridiem written on one end also covers the
/// other, as long as the range stays increasing.
fn parse_range(caps: &Captures, hint: Option<DayPart>) -> Option<TimeExpr> {
    let from = ClockToken::parse(caps.get(1)?.as_str())?;
    let to = ClockToken::parse(caps.get(2)?.as_str())?;

    let shared = match (from.meridiem, to.meridiem) {
        (None, Some(m)) | (Some(m), None) => from
            .resolve(Some(m), hint)
            .zip(to.resolve(Some(m), hint))
            .filter(|(start, end)| start < end),
        _ => None,
    };
    let (start, end) = match shared {
        Some(pair) => pair,
        None => (
            from.resolve(from.meridiem, hint)?,
            to.resolve(to.meridiem, hint)?,
        ),
    };
    Some(TimeExpr::Range(start, end))
}

fn parse_single_time(text: &str, hint: Option<DayPart>) -> Option<NaiveTime> {
    first_valid(&HALF_HOUR, text, |caps| clock(first_number(caps)?, 30, None, hint))
        .or_else(|| {
            first_valid(&HINTED_HOUR, text, |caps| {
                let (hour, word) = match caps.get(1) {
                    Some(hour) => (hour, caps.get(2)?),
                    None => {
                        let hour = caps.get(4)?;
                        if headcount_at(text, hour.end()) {
                            return None;
                        }
                        (hour, caps.get(3)?)
                    }
                };
                let part = DayPart::from_word(word.as_str())?;
                clock(hour.as_str().parse().ok()?, 0, None, Some(part))
            })
        })
        .or_else(|| {
            first_valid(&COLON_TIME, text, |caps| {
                clock(number(caps, 1)?, number(caps, 2)?, meridiem(caps, 3), hint)
            })
        })
        .or_else(|| {
            first_valid(&H_TIME, text, |caps| {
                clock(number(caps, 1)?, number(caps, 2).unwrap_or(0), None, hint)
            })
        })
        .or_else(|| first_valid(&HOUR_WORD_TIME, text, |caps| clock(number(caps, 1)?, 0, None, hint)))
        .or_else(|| {
            first_valid(&MERIDIEM_TIME, text, |caps| {
                clock(number(caps, 1)?, 0, meridiem(caps, 2), hint)
            })
        })
}

fn parse_time(text: &str, hint: Option<DayPart>) -> Option<TimeExpr> {
    // A bare "28-30" is more likely a date range than a time range.
    first_valid(&DASH_RANGE, text, |caps| {
        TIME_MARKER.is_match(&caps[0]).then(|| parse_range(caps, hint)).flatten()
    })
    .or_else(|| {
        first_valid(&FROM_TO_RANGE, text, |caps| {
            (TIME_MARKER.is_match(&caps[0]) || hint.is_some())
                .then(|| parse_range(caps, hint))
                .flatten()
        })
    })
    .or_else(|| parse_single_time(text, hint).map(TimeExpr::Single))
}

fn parse_devices(text: &str) -> IndexMap<DeviceCategory, u32> {
    let mut devices = IndexMap::new();

    for (category, pattern) in DEVICE_PATTERNS.iter() {
        let quantity = pattern
            .find_iter(text)
            .filter_map(|m| {
                let quantity = QUANTITY_BEFORE
                    .captures(&text[..m.start()])
                    .and_then(|caps| {
                        let raw = caps.get(1)?.as_str();
                        raw.parse().ok().or_else(|| number_value(raw))
                    })
                    .unwrap_or(1);
                (quantity > 0).then_some(quantity)
            })
            .max();

        if let Some(quantity) = quantity {
            devices.insert(*category, quantity);
        }
    }

    devices
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Reads requirements relative to a reference date
#[derive(Debug, Clone)]
pub struct IntentExtractor {
    today: NaiveDate,
    default_duration: Duration,
}

impl IntentExtractor {
    pub fn new(today: NaiveDate, default_duration: Duration) -> Self {
        Self {
            today,
            default_duration,
        }
    }

    pub fn extract(&self, text: &str) -> SchedulingResult<Requirement> {
        let text = join_spaced_minutes(&normalize(text));
        if text.is_empty() {
            return Err(SchedulingError::Validation("request text is empty".to_string()));
        }

        let attendees = parse_attendees(&text);
        let date = parse_date(&text, self.today)?.unwrap_or(self.today);
        let hint = detect_day_part(&text);

        let (start, mut end) = match parse_time(&text, hint) {
            Some(TimeExpr::Range(from, to)) => (date.and_time(from), date.and_time(to)),
            Some(TimeExpr::Single(from)) => {
                let start = date.and_time(from);
                (start, start + self.default_duration)
            }
            None => {
                return Err(parse_error(
                    IntentField::TimeWindow,
                    "no time expression found; try '9h-11h', 'từ 9h đến 11h', '3 chiều' or '09:30-11:00'",
                ))
            }
        };
        if end < start {
            end += Duration::days(1);
        }
        let window = TimeWindow::new(start, end).map_err(|_| {
            parse_error(
                IntentField::TimeWindow,
                format!("start and end are both {}", start.format("%H:%M")),
            )
        })?;

        let devices = parse_devices(&text);

        tracing::debug!(
            attendees = ?attendees,
            window = %window,
            devices = devices.len(),
            "Extracted booking requirement"
        );

        Ok(Requirement {
            attendees,
            date,
            window,
            devices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Wednesday
    fn extractor() -> IntentExtractor {
        IntentExtractor::new(NaiveDate::from_ymd_opt(2026, 1, 28).unwrap(), Duration::minutes(60))
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Họp  9h–11h, Phòng A. "), "họp 9h-11h phòng a");
        assert_eq!(normalize("9h -> 11h"), "9h - 11h");
    }

    #[test]
    fn test_dash_range_with_hour_marker() {
        let req = extractor().extract("9h-11h").unwrap();
        assert_eq!(req.window.start, day(28).and_time(hm(9, 0)));
        assert_eq!(req.window.end, day(28).and_time(hm(11, 0)));
    }

    #[test]
    fn test_colon_range_and_minutes() {
        let req = extractor().extract("họp 09:30-11:00 ngày mai").unwrap();
        assert_eq!(req.date, day(29));
        assert_eq!(req.window.start.time(), hm(9, 30));
        assert_eq!(req.window.end.time(), hm(11, 0));
    }

    #[test]
    fn test_afternoon_hint_remaps_hour() {
        let req = extractor().extract("họp lúc 3 chiều").unwrap();
        assert_eq!(req.window.start.time(), hm(15, 0));
        assert_eq!(req.window.end.time(), hm(16, 0));
    }

    #[test]
    fn test_single_time_variants() {
        let cases = [
            ("9 rưỡi", hm(9, 30)),
            ("half past 4", hm(4, 30)),
            ("8 tối", hm(20, 0)),
            ("12 trưa", hm(12, 0)),
            ("2pm", hm(14, 0)),
            ("10 giờ", hm(10, 0)),
            ("9h15", hm(9, 15)),
            ("9h 30", hm(9, 30)),
            ("9 h 05", hm(9, 5)),
            ("14:45", hm(14, 45)),
        ];
        for (text, expected) in cases {
            let req = extractor().extract(text).unwrap();
            assert_eq!(req.window.start.time(), expected, "{}", text);
        }
    }

    #[test]
    fn test_from_to_range_gated_by_marker_or_hint() {
        let req = extractor().extract("từ 2 đến 4 chiều").unwrap();
        assert_eq!(req.window.start.time(), hm(14, 0));
        assert_eq!(req.window.end.time(), hm(16, 0));

        // No marker, no hint: "28 đến 30" is not a time range.
        let req = extractor().extract("từ 28 đến 30 lúc 9h").unwrap();
        assert_eq!(req.window.start.time(), hm(9, 0));
        assert_eq!(req.window.end.time(), hm(10, 0));
    }

    #[test]
    fn test_meridiem_on_one_end_covers_the_range() {
        for text in ["meeting 1-3pm", "from 1 to 3pm"] {
            let req = extractor().extract(text).unwrap();
            assert_eq!(req.window.start.time(), hm(13, 0), "{}", text);
            assert_eq!(req.window.end.time(), hm(15, 0), "{}", text);
        }

        let req = extractor().extract("9am-11").unwrap();
        assert_eq!(req.window.start.time(), hm(9, 0));
        assert_eq!(req.window.end.time(), hm(11, 0));

        // 23:00-13:00 would run backwards, so the start keeps its own reading.
        let req = extractor().extract("11-1pm").unwrap();
        assert_eq!(req.window.start.time(), hm(11, 0));
        assert_eq!(req.window.end.time(), hm(13, 0));
    }

    #[test]
    fn test_spaced_minutes_leave_counts_alone() {
        let req = extractor().extract("9h 30 người").unwrap();
        assert_eq!(req.window.start.time(), hm(9, 0));
        assert_eq!(req.attendees, Some(30));

        let req = extractor().extract("9h 10 máy chiếu").unwrap();
        assert_eq!(req.window.start.time(), hm(9, 0));
        assert_eq!(req.devices.get(&DeviceCategory::Projector), Some(&10));

        let req = extractor().extract("9h 30-11h").unwrap();
        assert_eq!(req.window.start.time(), hm(9, 30));
        assert_eq!(req.window.end.time(), hm(11, 0));

        let req = extractor().extract("9h 15/3").unwrap();
        assert_eq!(req.window.start.time(), hm(9, 0));
        assert_eq!(req.date, NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());
    }

    #[test]
    fn test_unaccented_pronoun_before_headcount_is_not_a_hint() {
        // "toi" here is "me", not "evening"
        let req = extractor().extract("cho toi 10 nguoi luc 9h").unwrap();
        assert_eq!(req.attendees, Some(10));
        assert_eq!(req.window.start.time(), hm(9, 0));

        let req = extractor().extract("hop luc 8 toi").unwrap();
        assert_eq!(req.window.start.time(), hm(20, 0));
    }

    #[test]
    fn test_range_crossing_midnight() {
        let req = extractor().extract("23h-1h").unwrap();
        assert_eq!(req.window.start, day(28).and_time(hm(23, 0)));
        assert_eq!(req.window.end, day(29).and_time(hm(1, 0)));
    }

    #[test]
    fn test_empty_range_is_parse_error() {
        let err = extractor().extract("9h-9h").unwrap_err();
        assert!(matches!(
            err,
            SchedulingError::Parse {
                field: IntentField::TimeWindow,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_time_fails_loudly() {
        let err = extractor().extract("phòng cho 10 người ngày mai").unwrap_err();
        assert!(matches!(
            err,
            SchedulingError::Parse {
                field: IntentField::TimeWindow,
                ..
            }
        ));
    }

    #[test]
    fn test_attendees() {
        assert_eq!(extractor().extract("mười người 9h").unwrap().attendees, Some(10));
        assert_eq!(extractor().extract("khoảng 15 người 9h").unwrap().attendees, Some(15));
        assert_eq!(extractor().extract("mười hai người 9h").unwrap().attendees, Some(12));
        assert_eq!(extractor().extract("about 6 people at 9am").unwrap().attendees, Some(6));
        assert_eq!(extractor().extract("9h").unwrap().attendees, None);
    }

    #[test]
    fn test_dates() {
        let ex = extractor();
        assert_eq!(ex.extract("9h hôm nay").unwrap().date, day(28));
        assert_eq!(ex.extract("9h ngày kia").unwrap().date, day(30));
        assert_eq!(ex.extract("9h day after tomorrow").unwrap().date, day(30));
        assert_eq!(ex.extract("9h 3/2").unwrap().date, NaiveDate::from_ymd_opt(2026, 2, 3).unwrap());
        assert_eq!(
            ex.extract("9h 5-3-2027").unwrap().date,
            NaiveDate::from_ymd_opt(2027, 3, 5).unwrap()
        );
        assert_eq!(
            ex.extract("9h ngày 3 tháng 2").unwrap().date,
            NaiveDate::from_ymd_opt(2026, 2, 3).unwrap()
        );
        assert_eq!(ex.extract("9h mùng 5").unwrap().date, day(5));
        assert_eq!(ex.extract("9h the 30th").unwrap().date, day(30));
        assert_eq!(ex.extract("9h").unwrap().date, day(28));
    }

    #[test]
    fn test_weekday_rolls_past_today() {
        let ex = extractor();
        assert_eq!(ex.extract("thứ 5 9h").unwrap().date, day(29));
        assert_eq!(ex.extract("thứ 4 9h").unwrap().date, NaiveDate::from_ymd_opt(2026, 2, 4).unwrap());
        assert_eq!(ex.extract("chủ nhật 9h").unwrap().date, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(ex.extract("monday 9am").unwrap().date, NaiveDate::from_ymd_opt(2026, 2, 2).unwrap());
    }

    #[test]
    fn test_impossible_date_is_parse_error() {
        let err = extractor().extract("31/2 lúc 9h").unwrap_err();
        assert!(matches!(
            err,
            SchedulingError::Parse {
                field: IntentField::Date,
                ..
            }
        ));
    }

    #[test]
    fn test_devices_with_quantities() {
        let req = extractor()
            .extract("9h-11h cần 2 máy chiếu, hai mic và loa")
            .unwrap();
        let devices: Vec<(DeviceCategory, u32)> = req.devices.into_iter().collect();
        assert_eq!(
            devices,
            vec![
                (DeviceCategory::Projector, 2),
                (DeviceCategory::Microphone, 2),
                (DeviceCategory::Speaker, 1),
            ]
        );
    }

    #[test]
    fn test_device_quantity_ignores_clock_digits() {
        let req = extractor().extract("9:00-11:00 máy chiếu, 3 cái mic, mic").unwrap();
        assert_eq!(req.devices.get(&DeviceCategory::Projector), Some(&1));
        assert_eq!(req.devices.get(&DeviceCategory::Microphone), Some(&3));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let text = "Họp 8 người 14h-15h30 thứ 6, 1 projector, 2 laptops";
        let first = extractor().extract(text).unwrap();
        for _ in 0..5 {
            assert_eq!(extractor().extract(text).unwrap(), first);
        }
        assert_eq!(first.attendees, Some(8));
        assert_eq!(first.window.end.time(), hm(15, 30));
        assert_eq!(first.devices.get(&DeviceCategory::Computer), Some(&2));
    }
}
