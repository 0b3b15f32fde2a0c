use std::time::{Duration, Instant};

/// How a single requested item ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The tool exited zero
    Succeeded,
    /// `show` reported the package, nothing was attempted
    AlreadyInstalled,
    /// Deliberately not attempted, or the tool rejected the requirement
    Skipped(String),
    /// The tool exited nonzero or the item was invalid
    Failed(String),
}

/// Tracks the outcome of every item in one user action.
#[derive(Debug, Clone)]
pub struct OperationReport {
    started: Instant,
    requested: usize,
    outcomes: Vec<(String, Outcome)>,
}

impl OperationReport {
    /// Start the clock for an action covering `requested` items.
    pub fn new(requested: usize) -> Self {
        Self {
            started: Instant::now(),
            requested,
            outcomes: Vec::new(),
        }
    }

    /// Widen the request when items arrive one at a time.
    pub fn expect_more(&mut self, additional: usize) {
        self.requested += additional;
    }

    /// Record the outcome for `name`.
    pub fn record(&mut self, name: impl Into<String>, outcome: Outcome) {
        debug_assert!(self.outcomes.len() < self.requested);
        self.outcomes.push((name.into(), outcome));
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn successes(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Succeeded))
    }

    pub fn errors(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    pub fn already_installed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::AlreadyInstalled))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped(_)))
    }

    pub fn has_errors(&self) -> bool {
        self.errors() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Names that failed, with the reason, in the order they were attempted.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|(name, outcome)| match outcome {
            Outcome::Failed(reason) => Some((name.as_str(), reason.as_str())),
            _ => None,
        })
    }

    fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| predicate(o)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_outcome() {
        let mut report = OperationReport::new(4);
        report.record("a", Outcome::Succeeded);
        report.record("b", Outcome::Failed("exit 1".into()));
        report.record("c", Outcome::AlreadyInstalled);
        report.record("d", Outcome::Skipped("invalid requirement".into()));

        assert_eq!(report.successes(), 1);
        assert_eq!(report.errors(), 1);
        assert_eq!(report.already_installed(), 1);
        assert_eq!(report.skipped(), 1);
        assert!(report.has_errors());
        assert_eq!(report.failures().collect::<Vec<_>>(), vec![("b", "exit 1")]);
    }

    #[test]
    fn interactive_reports_grow_with_each_item() {
        let mut report = OperationReport::new(0);
        for name in ["a", "b"] {
            report.expect_more(1);
            report.record(name, Outcome::Succeeded);
        }
        assert_eq!(report.requested(), 2);
        assert_eq!(report.successes(), 2);
    }

    #[test]
    fn empty_report() {
        let report = OperationReport::new(0);
        assert!(report.is_empty());
        assert_eq!(report.successes() + report.errors(), 0);
        assert!(!report.has_errors());
    }
}
