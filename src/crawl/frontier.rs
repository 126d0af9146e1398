// src/crawl/frontier.rs
// =============================================================================
// This module implements the crawl frontier: the shared work list that all
// workers pull pages from and push newly discovered links onto.
//
// How it works:
// 1. The seed goes into the queue at depth 0
// 2. A worker takes the next entry (first-in, first-out) and claims its URL
// 3. A URL can be claimed once per crawl; later copies are thrown away
// 4. The worker pushes the links it found at depth + 1
// 5. The crawl is over when the queue is empty AND no worker is mid-fetch
//    (a page still being fetched may add more work)
//
// Duplicates are allowed in the queue. The claim set is the one place that
// decides whether a URL gets fetched, and pop + claim happen under a single
// lock so two workers can never both win the same URL.
//
// Rust concepts:
// - Mutex: Exclusive access to the queue and the claim set
// - Notify: Lets idle workers sleep until there is something to do
// - Drop: Releasing a claim happens automatically, even if a worker panics
// =============================================================================

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::fetcher::canonicalize;

/// A page waiting to be visited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    /// Link hops from the seed
    pub depth: usize,
}

#[derive(Default)]
struct FrontierState {
    queue: VecDeque<FrontierEntry>,
    claimed: HashSet<String>,
    // Entries handed out by next() whose Claim hasn't been dropped yet
    in_flight: usize,
}

impl FrontierState {
    fn try_claim(&mut self, url: &str) -> bool {
        self.claimed.insert(canonicalize(url))
    }

    // Pops until an unclaimed entry turns up, claiming it
    fn claim_next(&mut self) -> Option<FrontierEntry> {
        while let Some(entry) = self.queue.pop_front() {
            if self.try_claim(&entry.url) {
                return Some(entry);
            }
        }
        None
    }
}

/// Shared, order-preserving work list plus the set of claimed URLs
pub struct Frontier {
    max_depth: usize,
    state: Mutex<FrontierState>,
    changed: Notify,
}

impl Frontier {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            state: Mutex::new(FrontierState::default()),
            changed: Notify::new(),
        }
    }

    // Queues the seed at depth 0
    pub fn seed(&self, url: &str) {
        self.push(canonicalize(url), 0);
    }

    // Appends an entry unless it would be deeper than the crawl allows
    //
    // Returns false when the entry was rejected for depth. Already-claimed
    // URLs are still queued; they are dropped when popped.
    pub fn push(&self, url: String, depth: usize) -> bool {
        if depth > self.max_depth {
            return false;
        }

        self.lock().queue.push_back(FrontierEntry { url, depth });
        self.changed.notify_waiters();
        true
    }

    // Removes the oldest entry without claiming it
    pub fn pop(&self) -> Option<FrontierEntry> {
        self.lock().queue.pop_front()
    }

    // Claims a URL (by canonical form); true means the caller owns it
    pub fn try_claim(&self, url: &str) -> bool {
        self.lock().try_claim(url)
    }

    // Waits for the next unclaimed entry and claims it
    //
    // Returns None once the queue is empty and no claim is outstanding, so
    // every worker sees the end of the crawl at the same point. While other
    // workers are still fetching, an empty queue means "wait", not "done".
    pub async fn next(&self) -> Option<Claim<'_>> {
        loop {
            // Registered before looking at the state, so a push or release
            // that lands between the check and the await still wakes us
            let changed = self.changed.notified();

            {
                let mut state = self.lock();

                if let Some(entry) = state.claim_next() {
                    state.in_flight += 1;
                    return Some(Claim { entry, frontier: self });
                }

                if state.in_flight == 0 {
                    drop(state);
                    self.changed.notify_waiters();
                    return None;
                }
            }

            changed.await;
        }
    }

    // Number of distinct URLs claimed so far
    pub fn claimed_count(&self) -> usize {
        self.lock().claimed.len()
    }

    // Entries still queued (including duplicates that will be discarded)
    pub fn queued(&self) -> usize {
        self.lock().queue.len()
    }

    fn release(&self) {
        self.lock().in_flight -= 1;
        self.changed.notify_waiters();
    }

    // A panicking worker can't leave the queue half-updated: every critical
    // section is a single push, pop or insert, so the state stays usable
    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An entry owned by one worker until it is dropped
pub struct Claim<'a> {
    entry: FrontierEntry,
    frontier: &'a Frontier,
}

impl Claim<'_> {
    pub fn entry(&self) -> &FrontierEntry {
        &self.entry
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.frontier.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_pop_is_fifo() {
        let frontier = Frontier::new(3);
        frontier.seed("http://a.test/");
        frontier.push("http://a.test/b".to_string(), 1);
        frontier.push("http://a.test/c".to_string(), 1);

        let order: Vec<_> = std::iter::from_fn(|| frontier.pop()).map(|e| e.url).collect();
        assert_eq!(order, vec!["http://a.test/", "http://a.test/b", "http://a.test/c"]);
    }

    #[test]
    fn test_seed_is_canonical_at_depth_zero() {
        let frontier = Frontier::new(0);
        frontier.seed("http://a.test/page#section");

        let entry = frontier.pop().unwrap();
        assert_eq!(entry.url, "http://a.test/page");
        assert_eq!(entry.depth, 0);
    }

    #[test]
    fn test_push_rejects_entries_past_max_depth() {
        let frontier = Frontier::new(1);

        assert!(frontier.push("http://a.test/b".to_string(), 1));
        assert!(!frontier.push("http://a.test/c".to_string(), 2));
        assert_eq!(frontier.queued(), 1);
    }

    #[test]
    fn test_push_does_not_deduplicate() {
        let frontier = Frontier::new(1);
        frontier.push("http://a.test/b".to_string(), 1);
        frontier.push("http://a.test/b".to_string(), 1);
        assert_eq!(frontier.queued(), 2);
    }

    #[test]
    fn test_claim_is_by_canonical_url() {
        let frontier = Frontier::new(0);

        assert!(frontier.try_claim("http://a.test/b#one"));
        assert!(!frontier.try_claim("http://a.test/b#two"));
        assert!(!frontier.try_claim("http://a.test/b"));
        assert_eq!(frontier.claimed_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_claims_have_one_winner() {
        let frontier = Arc::new(Frontier::new(0));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let frontier = Arc::clone(&frontier);
                tokio::spawn(async move { frontier.try_claim("http://a.test/contested") })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_next_skips_claimed_duplicates() {
        let frontier = Frontier::new(1);
        frontier.seed("http://a.test/");
        frontier.push("http://a.test/".to_string(), 1);
        frontier.push("http://a.test/b".to_string(), 1);

        let first = frontier.next().await.unwrap();
        assert_eq!(first.entry().url, "http://a.test/");
        drop(first);

        let second = frontier.next().await.unwrap();
        assert_eq!(second.entry().url, "http://a.test/b");
        drop(second);

        assert!(frontier.next().await.is_none());
    }

    #[tokio::test]
    async fn test_next_ends_immediately_when_nothing_was_seeded() {
        let frontier = Frontier::new(0);
        assert!(frontier.next().await.is_none());
    }

    #[tokio::test]
    async fn test_idle_worker_waits_for_in_flight_work() {
        let frontier = Arc::new(Frontier::new(1));
        frontier.seed("http://a.test/");

        let claim = frontier.next().await.unwrap();

        // Queue is empty but the seed is still in flight: the second worker
        // has to wait instead of giving up
        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move {
                frontier.next().await.map(|claim| claim.entry().clone())
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        frontier.push("http://a.test/b".to_string(), 1);
        drop(claim);

        let picked = waiter.await.unwrap().unwrap();
        assert_eq!(picked.url, "http://a.test/b");
        assert_eq!(picked.depth, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_consumers_drain_a_growing_frontier() {
        const MAX_DEPTH: usize = 4;
        let frontier = Arc::new(Frontier::new(MAX_DEPTH));
        frontier.seed("http://a.test/0/0");

        // Every page links to two pages one level down, and pages at the
        // same depth share children, so the queue sees plenty of duplicates
        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let frontier = Arc::clone(&frontier);
                tokio::spawn(async move {
                    let mut visited = Vec::new();
                    while let Some(claim) = frontier.next().await {
                        let FrontierEntry { url, depth } = claim.entry().clone();
                        tokio::task::yield_now().await;
                        if depth < MAX_DEPTH {
                            for child in 0..2 {
                                frontier.push(format!("http://a.test/{}/{}", depth + 1, child), depth + 1);
                            }
                        }
                        visited.push(url);
                    }
                    visited
                })
            })
            .collect();

        let mut all = Vec::new();
        for consumer in consumers {
            all.extend(consumer.await.unwrap());
        }

        let distinct: HashSet<_> = all.iter().cloned().collect();
        assert_eq!(all.len(), distinct.len(), "a URL was visited twice");
        assert_eq!(distinct.len(), 1 + 2 * MAX_DEPTH);
        assert_eq!(frontier.claimed_count(), distinct.len());
    }
}
