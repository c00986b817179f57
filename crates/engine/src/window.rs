//! Relative time ranges used to scope dashboard aggregations.

use chrono::{DateTime, Months, Utc};

/// "Last N months" filter applied uniformly to every dashboard aggregation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DurationWindow {
    OneMonth,
    ThreeMonths,
    SixMonths,
    #[default]
    All,
}

impl DurationWindow {
    /// Parses the `duration` query value. Absent or unknown values mean
    /// [`DurationWindow::All`].
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("1month") => Self::OneMonth,
            Some("3months") => Self::ThreeMonths,
            Some("6months") => Self::SixMonths,
            _ => Self::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneMonth => "1month",
            Self::ThreeMonths => "3months",
            Self::SixMonths => "6months",
            Self::All => "all",
        }
    }

    fn months(self) -> Option<u32> {
        match self {
            Self::OneMonth => Some(1),
            Self::ThreeMonths => Some(3),
            Self::SixMonths => Some(6),
            Self::All => None,
        }
    }

    /// Inclusive lower bound of the window, or `None` for no bound.
    ///
    /// Uses calendar-month arithmetic: the day is clamped to the length of
    /// the target month, so `2024-03-31` minus one month is `2024-02-29`.
    pub fn start(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let months = self.months()?;
        now.checked_sub_months(Months::new(months))
    }
}
