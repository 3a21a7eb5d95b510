use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Presence of one student at one session.
///
/// Entries created by roster synchronization are absent with no timestamp
/// (`marked_at == None`); that unset timestamp distinguishes "never marked"
/// from "explicitly marked absent".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
    present: bool,
    marked_at: Option<NaiveDateTime>,
}

impl Attendance {
    /// Absent, never marked.
    pub const UNSET: Self = Self {
        present: false,
        marked_at: None,
    };

    #[must_use]
    pub const fn present_at(at: NaiveDateTime) -> Self {
        Self {
            present: true,
            marked_at: Some(at),
        }
    }

    #[must_use]
    pub const fn absent_at(at: NaiveDateTime) -> Self {
        Self {
            present: false,
            marked_at: Some(at),
        }
    }

    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.present
    }

    #[must_use]
    pub const fn marked_at(&self) -> Option<NaiveDateTime> {
        self.marked_at
    }

    /// True for the placeholder inserted by roster synchronization.
    #[must_use]
    pub const fn is_unset(&self) -> bool {
        self.marked_at.is_none()
    }
}

impl fmt::Display for Attendance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.present, self.marked_at) {
            (_, None) => f.write_str("unmarked"),
            (true, Some(at)) => write!(f, "present ({})", at.format("%Y-%m-%d %H:%M")),
            (false, Some(at)) => write!(f, "absent ({})", at.format("%Y-%m-%d %H:%M")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .expect("valid timestamp")
    }

    #[test]
    fn default_is_unset_absent() {
        let a = Attendance::default();
        assert_eq!(a, Attendance::UNSET);
        assert!(!a.is_present());
        assert!(a.is_unset());
        assert_eq!(a.to_string(), "unmarked");
    }

    #[test]
    fn marked_entries_carry_timestamp() {
        let p = Attendance::present_at(at(14, 30));
        assert!(p.is_present());
        assert_eq!(p.marked_at(), Some(at(14, 30)));
        assert_eq!(p.to_string(), "present (2024-03-15 14:30)");

        let a = Attendance::absent_at(at(15, 0));
        assert!(!a.is_present());
        assert!(!a.is_unset());
    }
}
