//! Display formats for the burned-in timestamp.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::settings::ParseSettingError;

const THAI_MONTHS: [&str; 12] = [
    "มกราคม",
    "กุมภาพันธ์",
    "มีนาคม",
    "เมษายน",
    "พฤษภาคม",
    "มิถุนายน",
    "กรกฎาคม",
    "สิงหาคม",
    "กันยายน",
    "ตุลาคม",
    "พฤศจิกายน",
    "ธันวาคม",
];

/// Indexed by days from Sunday.
const THAI_WEEKDAYS: [&str; 7] = [
    "อาทิตย์",
    "จันทร์",
    "อังคาร",
    "พุธ",
    "พฤหัสบดี",
    "ศุกร์",
    "เสาร์",
];

/// Offset between the Gregorian and Buddhist-era year.
const BUDDHIST_ERA_OFFSET: i32 = 543;

/// Timestamp rendering variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimestampFormat {
    /// Thai weekday/month names with a Buddhist-era year and explicit offset.
    #[default]
    ThaiVerbose,
    /// `YYYY-MM-DD HH:MM:SS`.
    Iso,
}

impl TimestampFormat {
    /// Render `value` in its own UTC offset.
    pub fn format(self, value: &DateTime<FixedOffset>) -> String {
        match self {
            Self::ThaiVerbose => format_thai_verbose(value),
            Self::Iso => format_iso(value),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ThaiVerbose => "thai-verbose",
            Self::Iso => "iso",
        }
    }
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimestampFormat {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thai-verbose" | "thai" => Ok(Self::ThaiVerbose),
            "iso" => Ok(Self::Iso),
            _ => Err(ParseSettingError::new("timestamp format", s)),
        }
    }
}

fn format_thai_verbose(value: &DateTime<FixedOffset>) -> String {
    let weekday = THAI_WEEKDAYS[value.weekday().num_days_from_sunday() as usize];
    let month = THAI_MONTHS[value.month0() as usize];
    format!(
        "วัน{weekday}ที่ {} {month} {} {} GMT{}",
        value.day(),
        value.year() + BUDDHIST_ERA_OFFSET,
        value.format("%H:%M:%S"),
        value.format("%:z"),
    )
}

/// `YYYY-MM-DD HH:MM:SS` in the value's own offset.
pub fn format_iso(value: &DateTime<FixedOffset>) -> String {
    value.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bangkok(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_iso_format() {
        let t = bangkok("2024-03-09T14:05:59+07:00");
        assert_eq!(TimestampFormat::Iso.format(&t), "2024-03-09 14:05:59");
    }

    #[test]
    fn test_thai_verbose_format() {
        // 9 March 2024 is a Saturday.
        let t = bangkok("2024-03-09T14:05:59+07:00");
        assert_eq!(
            TimestampFormat::ThaiVerbose.format(&t),
            "วันเสาร์ที่ 9 มีนาคม 2567 14:05:59 GMT+07:00"
        );
    }

    #[test]
    fn test_thai_verbose_uses_value_offset() {
        let t = bangkok("2023-12-31T23:00:00+00:00");
        let text = TimestampFormat::ThaiVerbose.format(&t);
        assert!(text.starts_with("วันอาทิตย์ที่ 31 ธันวาคม 2566"));
        assert!(text.ends_with("GMT+00:00"));
    }

    #[test]
    fn test_parse_and_serde_names_agree() {
        for format in [TimestampFormat::ThaiVerbose, TimestampFormat::Iso] {
            let json = serde_json::to_string(&format).unwrap();
            assert_eq!(json, format!("\"{}\"", format.as_str()));
            assert_eq!(format.as_str().parse::<TimestampFormat>().unwrap(), format);
        }
        assert!("rfc2822".parse::<TimestampFormat>().is_err());
    }

    proptest::proptest! {
        #[test]
        fn prop_thai_verbose_uses_buddhist_year_and_own_offset(
            secs in 0i64..4_102_444_800,
            offset_hours in -12i32..=14,
        ) {
            let offset = FixedOffset::east_opt(offset_hours * 3600).unwrap();
            let t = DateTime::from_timestamp(secs, 0).unwrap().with_timezone(&offset);
            let text = TimestampFormat::ThaiVerbose.format(&t);
            let year = (t.year() + BUDDHIST_ERA_OFFSET).to_string();
            proptest::prop_assert!(text.starts_with("วัน"));
            let needle = format!(" {year} ");
            proptest::prop_assert!(text.contains(&needle));
            let suffix = format!("GMT{}", t.format("%:z"));
            proptest::prop_assert!(text.ends_with(&suffix));
            proptest::prop_assert_eq!(TimestampFormat::Iso.format(&t).len(), 19);
        }
    }
}
