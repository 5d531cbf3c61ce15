use chrono::{DateTime, FixedOffset, NaiveTime, Utc};

use crate::{Error, Result};

/// Daily time-of-day range during which scheduled scans are allowed.
///
/// `start` is inclusive and `end` exclusive, both in local time at `offset`.
/// A window with `start > end` wraps past midnight; `start == end` is never
/// active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub offset: FixedOffset,
}

impl ActiveWindow {
    pub fn new(start: NaiveTime, end: NaiveTime, offset: FixedOffset) -> Self {
        Self { start, end, offset }
    }

    /// Build from `HH:MM` strings and an offset east of UTC in minutes.
    pub fn parse(start: &str, end: &str, utc_offset_minutes: i32) -> Result<Self> {
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60).ok_or_else(|| {
            Error::Config(format!("UTC offset out of range: {utc_offset_minutes} minutes"))
        })?;
        Ok(Self::new(parse_hhmm(start)?, parse_hhmm(end)?, offset))
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        let t = now.with_timezone(&self.offset).time();
        if self.start <= self.end {
            t >= self.start && t < self.end
        } else {
            t >= self.start || t < self.end
        }
    }

    pub fn is_active_now(&self) -> bool {
        self.is_active_at(Utc::now())
    }
}

impl std::fmt::Display for ActiveWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}–{} (UTC{})",
            self.start.format("%H:%M"),
            self.end.format("%H:%M"),
            self.offset
        )
    }
}

fn parse_hhmm(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|e| Error::Config(format!("invalid time of day '{s}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const IST_MINUTES: i32 = 330;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(IST_MINUTES * 60).unwrap()
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        ist()
            .with_ymd_and_hms(2026, 3, 14, h, m, s)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn default_window_bounds_are_start_inclusive_end_exclusive() {
        let w = ActiveWindow::parse("07:00", "23:00", IST_MINUTES).unwrap();
        assert!(w.is_active_at(at(7, 0, 0)));
        assert!(w.is_active_at(at(22, 59, 59)));
        assert!(!w.is_active_at(at(6, 59, 59)));
        assert!(!w.is_active_at(at(23, 0, 0)));
    }

    #[test]
    fn window_is_evaluated_in_its_own_offset() {
        let w = ActiveWindow::parse("07:00", "23:00", IST_MINUTES).unwrap();
        // 01:30 UTC is 07:00 IST.
        let utc = Utc.with_ymd_and_hms(2026, 3, 14, 1, 30, 0).unwrap();
        assert!(w.is_active_at(utc));
        let utc = Utc.with_ymd_and_hms(2026, 3, 14, 1, 29, 59).unwrap();
        assert!(!w.is_active_at(utc));
    }

    #[test]
    fn window_wrapping_midnight() {
        let w = ActiveWindow::parse("22:00", "02:00", IST_MINUTES).unwrap();
        assert!(w.is_active_at(at(23, 30, 0)));
        assert!(w.is_active_at(at(1, 59, 59)));
        assert!(!w.is_active_at(at(2, 0, 0)));
        assert!(!w.is_active_at(at(12, 0, 0)));
    }

    #[test]
    fn empty_window_is_never_active() {
        let w = ActiveWindow::parse("09:00", "09:00", 0).unwrap();
        assert!(!w.is_active_at(at(9, 0, 0)));
    }

    #[test]
    fn rejects_malformed_times() {
        assert!(matches!(
            ActiveWindow::parse("7am", "23:00", 0),
            Err(Error::Config(_))
        ));
        assert!(ActiveWindow::parse("07:00", "23:00", 24 * 60).is_err());
    }

    #[test]
    fn window_around_the_current_time_is_active_now() {
        let now = Utc::now().time();
        let hour = chrono::Duration::hours(1);
        let open = ActiveWindow::new(now - hour, now + hour, FixedOffset::east_opt(0).unwrap());
        assert!(open.is_active_now());

        let later = ActiveWindow::new(
            now + hour,
            now + hour + hour,
            FixedOffset::east_opt(0).unwrap(),
        );
        assert!(!later.is_active_now());
    }
}
