//! Trailing-edge debounce for text input

use std::time::{Duration, Instant};

/// Holds the latest value and hands it out once it has stopped changing for
/// `delay`. Rapid changes collapse into one settled value.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    settled: T,
    pending: Option<(T, Instant)>,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            delay,
            settled: initial,
            pending: None,
        }
    }

    /// Record a new value seen at `now`.
    pub fn set(&mut self, value: T, now: Instant) {
        match &self.pending {
            Some((pending, _)) if *pending == value => {}
            None if self.settled == value => {}
            _ => self.pending = Some((value, now)),
        }
    }

    /// Promote the pending value if it has been quiet long enough. Returns
    /// the newly settled value, once.
    pub fn poll(&mut self, now: Instant) -> Option<&T> {
        let ready = matches!(&self.pending, Some((_, at)) if now.duration_since(*at) >= self.delay);
        if !ready {
            return None;
        }
        let (value, _) = self.pending.take()?;
        if value == self.settled {
            return None;
        }
        self.settled = value;
        Some(&self.settled)
    }

    pub fn value(&self) -> &T {
        &self.settled
    }

    /// Time left until the pending value settles
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(_, at)| self.delay.saturating_sub(now.duration_since(*at)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(300);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn rapid_keystrokes_settle_once() {
        let start = Instant::now();
        let mut search = Debouncer::new(String::new(), DELAY);
        let mut settled = Vec::new();

        for (i, text) in ["b", "bi", "bit", "bitc"].into_iter().enumerate() {
            let now = start + ms(i as u64 * 100);
            search.set(text.to_string(), now);
            if let Some(v) = search.poll(now) {
                settled.push(v.clone());
            }
        }
        // still inside the quiet window of the last keystroke
        assert!(search.poll(start + ms(500)).is_none());

        let quiet = start + ms(300 + 300);
        settled.extend(search.poll(quiet).cloned());
        settled.extend(search.poll(quiet + ms(1000)).cloned());

        assert_eq!(settled, ["bitc"]);
        assert_eq!(search.value(), "bitc");
    }

    #[test]
    fn returning_to_settled_value_yields_nothing() {
        let start = Instant::now();
        let mut search = Debouncer::new("eth".to_string(), DELAY);
        search.set("et".into(), start);
        search.set("eth".into(), start + ms(50));
        assert!(search.poll(start + ms(400)).is_none());
        assert_eq!(search.remaining(start + ms(400)), None);
    }

    #[test]
    fn remaining_counts_down() {
        let start = Instant::now();
        let mut search = Debouncer::new(String::new(), DELAY);
        assert_eq!(search.remaining(start), None);
        search.set("s".into(), start);
        assert_eq!(search.remaining(start + ms(100)), Some(ms(200)));
        assert_eq!(search.remaining(start + ms(900)), Some(Duration::ZERO));
    }
}
