//! Bundle build lifecycle events

use chrono::{DateTime, Utc};

/// Build lifecycle notifications from the bundler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    /// A bundle build started
    Start,

    /// Overall progress of the running build, 0-100
    Progress { percent: u8 },

    /// The build finished, successfully unless `error` is set
    Finish {
        error: Option<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    },
}

impl BuildEvent {
    /// Progress event with the percentage clamped to 100
    pub fn progress(percent: u32) -> Self {
        BuildEvent::Progress {
            percent: percent.min(100) as u8,
        }
    }

    /// Percentage of transformed files, rounded down. `None` when there is no total.
    pub fn percent_of(done: u64, total: u64) -> Option<u32> {
        if total == 0 {
            return None;
        }
        let percent = done.saturating_mul(100) / total;
        Some(percent.min(100) as u32)
    }
}

/// Elapsed build time in whole milliseconds
pub fn elapsed_ms(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> i64 {
    (end_time - start_time).num_milliseconds()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_progress_clamps() {
        assert_eq!(BuildEvent::progress(42), BuildEvent::Progress { percent: 42 });
        assert_eq!(BuildEvent::progress(250), BuildEvent::Progress { percent: 100 });
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(BuildEvent::percent_of(0, 10), Some(0));
        assert_eq!(BuildEvent::percent_of(1, 3), Some(33));
        assert_eq!(BuildEvent::percent_of(2, 3), Some(66));
        assert_eq!(BuildEvent::percent_of(10, 10), Some(100));
        assert_eq!(BuildEvent::percent_of(12, 10), Some(100));
        assert_eq!(BuildEvent::percent_of(5, 0), None);
    }

    #[test]
    fn test_elapsed_ms() {
        let start = Utc::now();
        let end = start + Duration::milliseconds(1234);
        assert_eq!(elapsed_ms(start, end), 1234);
        assert_eq!(elapsed_ms(start, start), 0);
    }
}
