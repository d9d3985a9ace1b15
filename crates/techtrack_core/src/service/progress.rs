//! Aggregate learning progress.

use crate::model::technology::{Technology, TechnologyStatus};
use chrono::NaiveDate;

/// Dashboard counters for one collection on one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSummary {
    pub total: usize,
    pub not_started: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub overdue: usize,
    /// `completed / total`, rounded to the nearest whole percent; 0 when empty.
    pub completion_percent: u8,
}

impl ProgressSummary {
    pub fn from_technologies(technologies: &[Technology], today: NaiveDate) -> Self {
        let mut summary = Self {
            total: technologies.len(),
            ..Self::default()
        };
        for technology in technologies {
            match technology.status {
                TechnologyStatus::NotStarted => summary.not_started += 1,
                TechnologyStatus::InProgress => summary.in_progress += 1,
                TechnologyStatus::Completed => summary.completed += 1,
            }
            if technology.is_overdue(today) {
                summary.overdue += 1;
            }
        }
        summary.completion_percent = completion_percent(summary.completed, summary.total);
        summary
    }

    /// Count for one status.
    pub fn count(&self, status: TechnologyStatus) -> usize {
        match status {
            TechnologyStatus::NotStarted => self.not_started,
            TechnologyStatus::InProgress => self.in_progress,
            TechnologyStatus::Completed => self.completed,
        }
    }
}

fn completion_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (completed * 100 + total / 2) / total;
    u8::try_from(percent.min(100)).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::ProgressSummary;
    use crate::model::technology::{Technology, TechnologyStatus};
    use chrono::NaiveDate;

    #[test]
    fn counts_statuses_overdue_and_percent() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let past = NaiveDate::from_ymd_opt(2025, 1, 1);

        let mut done = Technology::new("A");
        done.status = TechnologyStatus::Completed;
        done.deadline = past;
        let mut late = Technology::new("B");
        late.status = TechnologyStatus::InProgress;
        late.deadline = past;
        let open = Technology::new("C");

        let summary = ProgressSummary::from_technologies(&[done, late, open], today);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.count(TechnologyStatus::Completed), 1);
        assert_eq!(summary.count(TechnologyStatus::InProgress), 1);
        assert_eq!(summary.count(TechnologyStatus::NotStarted), 1);
        assert_eq!(summary.overdue, 1);
        assert_eq!(summary.completion_percent, 33);
    }

    #[test]
    fn empty_collection_is_zero_percent() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert_eq!(
            ProgressSummary::from_technologies(&[], today),
            ProgressSummary::default()
        );
    }
}
