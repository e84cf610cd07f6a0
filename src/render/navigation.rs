//! Navigation-scoped asynchronous resolution
//!
//! A [`Navigator`] tracks which target is currently on screen. Each call
//! to [`Navigator::navigate`] issues a [`Ticket`]; a result is only
//! applied when its ticket still belongs to the latest navigation, so a
//! slow lookup for a page the reader already left can never overwrite
//! the page they are looking at.

use std::future::Future;
use tokio::sync::watch;

/// What the page shows for the current target
#[derive(Debug, Clone, PartialEq)]
pub enum PageState<T> {
    /// A resolution is in flight
    Loading,
    Ready(T),
    /// The resolution finished with nothing to show
    Empty,
}

/// Proof of a navigation, handed back when its result arrives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<K> {
    generation: u64,
    target: K,
}

impl<K> Ticket<K> {
    pub fn target(&self) -> &K {
        &self.target
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The displayed state along with the navigation it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<K, T> {
    pub generation: u64,
    pub target: Option<K>,
    pub state: PageState<T>,
}

pub struct Navigator<K, T> {
    state: watch::Sender<Snapshot<K, T>>,
}

impl<K, T> Default for Navigator<K, T>
where
    K: Clone + std::fmt::Debug,
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> Navigator<K, T>
where
    K: Clone + std::fmt::Debug,
    T: Clone,
{
    pub fn new() -> Self {
        let (state, _) = watch::channel(Snapshot {
            generation: 0,
            target: None,
            state: PageState::Empty,
        });
        Self { state }
    }

    /// Start navigating to `target`; the page shows `Loading` until the
    /// returned ticket is completed.
    pub fn navigate(&self, target: K) -> Ticket<K> {
        let mut generation = 0;
        self.state.send_modify(|snapshot| {
            snapshot.generation += 1;
            snapshot.target = Some(target.clone());
            snapshot.state = PageState::Loading;
            generation = snapshot.generation;
        });

        tracing::debug!("Navigating to {:?} (generation {})", target, generation);
        Ticket { generation, target }
    }

    pub fn is_current(&self, ticket: &Ticket<K>) -> bool {
        self.state.borrow().generation == ticket.generation
    }

    /// Apply a result for `ticket`. Returns `false`, leaving the page
    /// untouched, when a newer navigation has superseded the ticket.
    pub fn complete(&self, ticket: &Ticket<K>, value: Option<T>) -> bool {
        let applied = self.state.send_if_modified(|snapshot| {
            if snapshot.generation != ticket.generation {
                return false;
            }
            snapshot.state = match value {
                Some(value) => PageState::Ready(value),
                None => PageState::Empty,
            };
            true
        });

        if !applied {
            tracing::debug!(
                "Discarding stale result for {:?} (generation {})",
                ticket.target,
                ticket.generation
            );
        }
        applied
    }

    /// Await `resolution` and apply it under `ticket`
    pub async fn resolve<F>(&self, ticket: &Ticket<K>, resolution: F) -> bool
    where
        F: Future<Output = Option<T>>,
    {
        let value = resolution.await;
        self.complete(ticket, value)
    }

    pub fn snapshot(&self) -> Snapshot<K, T> {
        self.state.borrow().clone()
    }

    /// Receive every change to the displayed state
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<K, T>> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_navigate_then_complete() {
        let nav: Navigator<String, String> = Navigator::new();
        let ticket = nav.navigate("hello-world".to_string());
        assert_eq!(nav.snapshot().state, PageState::Loading);

        assert!(nav.complete(&ticket, Some("Hello World".to_string())));
        let snapshot = nav.snapshot();
        assert_eq!(snapshot.target.as_deref(), Some("hello-world"));
        assert_eq!(snapshot.state, PageState::Ready("Hello World".to_string()));
    }

    #[tokio::test]
    async fn test_not_found_becomes_empty() {
        let nav: Navigator<&str, String> = Navigator::new();
        let ticket = nav.navigate("missing");
        assert!(nav.resolve(&ticket, async { None }).await);
        assert_eq!(nav.snapshot().state, PageState::Empty);
    }

    #[tokio::test]
    async fn test_superseded_result_is_discarded() {
        let nav: Arc<Navigator<&'static str, &'static str>> = Arc::new(Navigator::new());
        let (slow_tx, slow_rx) = oneshot::channel();

        let first = nav.navigate("first");
        let slow = {
            let nav = Arc::clone(&nav);
            let first = first.clone();
            tokio::spawn(async move { nav.resolve(&first, async { slow_rx.await.ok() }).await })
        };

        let second = nav.navigate("second");
        assert!(!nav.is_current(&first));
        assert!(nav.is_current(&second));
        assert!(nav.complete(&second, Some("second page")));

        // The first lookup finishes last and must not replace the page
        slow_tx.send("first page").unwrap();
        assert!(!slow.await.unwrap());

        let snapshot = nav.snapshot();
        assert_eq!(snapshot.target, Some("second"));
        assert_eq!(snapshot.state, PageState::Ready("second page"));
        assert_eq!(snapshot.generation, second.generation());
    }

    #[tokio::test]
    async fn test_subscribers_see_final_state() {
        let nav: Navigator<u32, u32> = Navigator::new();
        let mut rx = nav.subscribe();

        let ticket = nav.navigate(7);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().state, PageState::Loading);

        nav.complete(&ticket, Some(49));
        tokio::time::timeout(Duration::from_secs(1), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rx.borrow().state, PageState::Ready(49));
    }
}
