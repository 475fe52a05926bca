//! Host-polled fixed-interval schedules for background persistence.

/// Fixed-interval schedule polled by the host loop or a browser timer callback.
///
/// The first poll arms the schedule; it fires once `interval_ms` has elapsed since the last
/// firing. A poll that arrives late fires once and re-arms from the poll time, so missed
/// intervals never queue up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalSchedule {
    interval_ms: u64,
    next_due_ms: Option<u64>,
}

impl IntervalSchedule {
    /// Creates a schedule firing every `interval_ms` milliseconds (minimum 1ms).
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            next_due_ms: None,
        }
    }

    /// Returns the configured interval.
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Returns when the schedule next fires, if armed.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.next_due_ms
    }

    /// Arms the schedule relative to `now_ms`, discarding any pending due time.
    pub fn reset(&mut self, now_ms: u64) {
        self.next_due_ms = Some(now_ms.saturating_add(self.interval_ms));
    }

    /// Returns `true` when the schedule is due at `now_ms` and re-arms it.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.next_due_ms {
            None => {
                self.reset(now_ms);
                false
            }
            Some(due) if now_ms >= due => {
                self.reset(now_ms);
                true
            }
            Some(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_poll_arms_without_firing() {
        let mut schedule = IntervalSchedule::new(100);
        assert!(!schedule.poll(1_000));
        assert_eq!(schedule.next_due_ms(), Some(1_100));
    }

    #[test]
    fn fires_once_per_elapsed_interval() {
        let mut schedule = IntervalSchedule::new(100);
        schedule.poll(0);
        assert!(!schedule.poll(99));
        assert!(schedule.poll(100));
        assert!(!schedule.poll(150));
        assert!(schedule.poll(200));
    }

    #[test]
    fn late_poll_fires_once_and_rearms_from_poll_time() {
        let mut schedule = IntervalSchedule::new(100);
        schedule.poll(0);
        assert!(schedule.poll(1_000));
        assert!(!schedule.poll(1_050));
        assert_eq!(schedule.next_due_ms(), Some(1_100));
    }

    #[test]
    fn zero_interval_is_clamped() {
        assert_eq!(IntervalSchedule::new(0).interval_ms(), 1);
    }
}
