use std::path::Path;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

// The recorder names files YYMMDD_HHMM with an optional suffix after the
// time part (duplicate counters etc.), so only anchor the start of the stem.
static FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})(\d{2})(\d{2})_(\d{2})(\d{2})").unwrap());

/// Timestamp parsed from a recorder filename. Minute precision only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilenameTimestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

impl FilenameTimestamp {
    /// Reconstruct the condensed YYMMDD_HHMM form.
    pub fn condensed(&self) -> String {
        format!(
            "{:02}{:02}{:02}_{:02}{:02}",
            self.year % 100,
            self.month,
            self.day,
            self.hour,
            self.minute
        )
    }

    /// Convert to a datetime with seconds zeroed. None for day numbers the
    /// calendar does not have (the parser itself only bounds day to 1-31).
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)?
            .and_hms_opt(self.hour as u32, self.minute as u32, 0)
    }
}

/// Parse the YYMMDD_HHMM prefix of a recorder filename. Two-digit years are
/// 2000-based. Out-of-range fields count as a parse failure; never panics.
pub fn parse_filename_timestamp(filename: &str) -> Option<FilenameTimestamp> {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);

    let caps = FILENAME_RE.captures(stem)?;
    let num = |i: usize| caps.get(i).unwrap().as_str().parse::<u8>().unwrap();

    let ts = FilenameTimestamp {
        year: 2000 + num(1) as u16,
        month: num(2),
        day: num(3),
        hour: num(4),
        minute: num(5),
    };

    let in_range = (1..=12).contains(&ts.month)
        && (1..=31).contains(&ts.day)
        && ts.hour <= 23
        && ts.minute <= 59;
    in_range.then_some(ts)
}
