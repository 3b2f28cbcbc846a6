use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// RT Plan creation instant (RTPlanDate + RTPlanTime)
///
/// Ordered chronologically. A missing time sorts before any time on the
/// same date, a missing date before any date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct PlanTimestamp {
    /// Date as YYYYMMDD
    pub date: Option<u32>,
    /// Time of day in microseconds since midnight
    pub time: Option<u64>,
}

impl PlanTimestamp {
    /// Creates a new PlanTimestamp
    pub fn new(date: Option<u32>, time: Option<u64>) -> Self {
        Self { date, time }
    }

    /// Parses RTPlanDate/RTPlanTime strings; unparseable parts become `None`
    pub fn parse(date: Option<&str>, time: Option<&str>) -> Self {
        Self {
            date: date.and_then(parse_date),
            time: time.and_then(parse_time),
        }
    }
}

/// Parses a DICOM DA value (YYYYMMDD)
pub fn parse_date(s: &str) -> Option<u32> {
    let s = s.trim();
    if s.len() == 8 && s.chars().all(|c| c.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

/// Parses a DICOM TM value (HH, HHMM, HHMMSS, HHMMSS.FFFFFF) into microseconds
pub fn parse_time(s: &str) -> Option<u64> {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    let re = REGEX.get_or_init(|| {
        Regex::new(r"^(\d{2})(\d{2})?(\d{2})?(?:\.(\d{1,6}))?$").expect("Failed to compile regex")
    });

    let caps = re.captures(s.trim())?;
    let field = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    let fraction = caps
        .get(4)
        .map(|m| {
            let digits = m.as_str();
            let value: u64 = digits.parse().unwrap_or(0);
            value * 10u64.pow(6 - digits.len() as u32)
        })
        .unwrap_or(0);

    Some(((field(1) * 60 + field(2)) * 60 + field(3)) * 1_000_000 + fraction)
}

impl fmt::Display for PlanTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.date {
            Some(date) => write!(f, "{}", date)?,
            None => write!(f, "unknown date")?,
        }
        if let Some(time) = self.time {
            let seconds = time / 1_000_000;
            write!(
                f,
                " {:02}:{:02}:{:02}",
                seconds / 3600,
                (seconds / 60) % 60,
                seconds % 60
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("120000", Some(12 * 3600 * 1_000_000))]
    #[case("090000.5", Some((9 * 3600) * 1_000_000 + 500_000))]
    #[case("1200", Some(12 * 3600 * 1_000_000))]
    #[case("12", Some(12 * 3600 * 1_000_000))]
    #[case("12:00", None)]
    #[case("", None)]
    fn test_parse_time(#[case] input: &str, #[case] expected: Option<u64>) {
        assert_eq!(parse_time(input), expected);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("20190601"), Some(20190601));
        assert_eq!(parse_date("2019-06-01"), None);
    }

    #[test]
    fn test_chronological_order() {
        let morning = PlanTimestamp::parse(Some("20190601"), Some("090000"));
        let noon = PlanTimestamp::parse(Some("20190601"), Some("120000"));
        let next_day = PlanTimestamp::parse(Some("20190602"), None);
        let undated = PlanTimestamp::parse(None, Some("235959"));

        assert!(morning < noon);
        assert!(noon < next_day);
        assert!(undated < morning);
    }

    #[test]
    fn test_display() {
        let ts = PlanTimestamp::parse(Some("20190601"), Some("120005"));
        assert_eq!(ts.to_string(), "20190601 12:00:05");
    }
}
