//! Urgency-ordered work queue
//!
//! Items are kept sorted at all times: priority first (`critical` ahead of
//! `low`), then ascending health score. A URL is present at most once.

use autoseo_core::QueueItem;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Urgency comparison used for queue ordering
pub fn urgency(a: &QueueItem, b: &QueueItem) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then(a.health_score.cmp(&b.health_score))
}

/// Priority queue of URLs awaiting optimization
#[derive(Debug, Clone, Default)]
pub struct OptimizationQueue {
    items: Vec<QueueItem>,
    urls: HashSet<String>,
}

impl OptimizationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item in urgency order. Returns `false` if the URL is already queued.
    pub fn insert(&mut self, item: QueueItem) -> bool {
        if self.urls.contains(&item.url) {
            return false;
        }
        // Insert after every item that is at least as urgent, preserving FIFO among equals
        let idx = self
            .items
            .partition_point(|existing| urgency(existing, &item) != Ordering::Greater);
        self.urls.insert(item.url.clone());
        self.items.insert(idx, item);
        true
    }

    /// Put a failed item back in line
    pub fn requeue(&mut self, item: QueueItem) -> bool {
        let inserted = self.insert(item);
        self.resort();
        inserted
    }

    /// Remove and return the most urgent item
    pub fn pop(&mut self) -> Option<QueueItem> {
        if self.items.is_empty() {
            return None;
        }
        let item = self.items.remove(0);
        self.urls.remove(&item.url);
        Some(item)
    }

    pub fn peek(&self) -> Option<&QueueItem> {
        self.items.first()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Re-sort by priority then health score
    pub fn resort(&mut self) {
        self.items.sort_by(urgency);
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.urls.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueItem> {
        self.items.iter()
    }

    /// Copy of the current ordering for observers
    pub fn snapshot(&self) -> Vec<QueueItem> {
        self.items.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoseo_core::Priority;

    fn item(url: &str, priority: Priority, health: u8) -> QueueItem {
        QueueItem::new(url, priority, health)
    }

    fn assert_ordered(queue: &OptimizationQueue) {
        let items = queue.snapshot();
        for pair in items.windows(2) {
            assert_ne!(
                urgency(&pair[0], &pair[1]),
                Ordering::Greater,
                "{} ({:?}/{}) ahead of {} ({:?}/{})",
                pair[0].url,
                pair[0].priority,
                pair[0].health_score,
                pair[1].url,
                pair[1].priority,
                pair[1].health_score
            );
        }
    }

    #[test]
    fn test_critical_pops_before_high() {
        let mut queue = OptimizationQueue::new();
        queue.insert(item("B", Priority::High, 80));
        queue.insert(item("A", Priority::Critical, 10));

        assert_eq!(queue.pop().unwrap().url, "A");
        assert_eq!(queue.pop().unwrap().url, "B");
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_ties_broken_by_health_score() {
        let mut queue = OptimizationQueue::new();
        queue.insert(item("healthy", Priority::Medium, 65));
        queue.insert(item("sick", Priority::Medium, 52));
        queue.insert(item("low", Priority::Low, 5));

        let urls: Vec<_> = queue.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, vec!["sick", "healthy", "low"]);
    }

    #[test]
    fn test_duplicate_insert_is_ignored() {
        let mut queue = OptimizationQueue::new();
        assert!(queue.insert(item("A", Priority::Low, 60)));
        assert!(!queue.insert(item("A", Priority::Critical, 1)));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.peek().unwrap().priority, Priority::Low);
    }

    #[test]
    fn test_pop_allows_reinsert() {
        let mut queue = OptimizationQueue::new();
        queue.insert(item("A", Priority::High, 40));
        let popped = queue.pop().unwrap();
        assert!(!queue.contains("A"));
        assert!(queue.requeue(popped));
        assert!(queue.contains("A"));
    }

    #[test]
    fn test_ordering_holds_for_mixed_inserts() {
        let mut queue = OptimizationQueue::new();
        let priorities = [
            Priority::Low,
            Priority::Critical,
            Priority::Medium,
            Priority::High,
        ];
        for n in 0..40u8 {
            let priority = priorities[(n as usize * 7) % 4];
            let health = ((n as u32 * 37) % 100) as u8;
            queue.insert(item(&format!("url-{n}"), priority, health));
            assert_ordered(&queue);
        }
        assert_eq!(queue.len(), 40);

        queue.resort();
        assert_ordered(&queue);
    }
}
