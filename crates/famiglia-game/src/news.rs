//! Admin announcements.
//!
//! Kept in a bounded in-process ring: once `capacity` items exist the
//! oldest is dropped, and everything is lost on restart.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use famiglia_protocol::NewsItem;
use tokio::sync::RwLock;

#[derive(Debug)]
struct Board {
    items: VecDeque<NewsItem>,
    next_id: u64,
}

/// The news feed shown to every player.
#[derive(Debug)]
pub struct NewsBoard {
    board: RwLock<Board>,
    capacity: usize,
}

impl NewsBoard {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            board: RwLock::new(Board {
                items: VecDeque::with_capacity(capacity),
                next_id: 1,
            }),
            capacity,
        }
    }

    /// Adds an item and returns it with its id.
    pub async fn publish(&self, title: &str, message: &str, now: DateTime<Utc>) -> NewsItem {
        let mut board = self.board.write().await;
        let item = NewsItem {
            id: board.next_id,
            title: title.to_string(),
            message: message.to_string(),
            published_at: now,
        };
        board.next_id += 1;
        if board.items.len() == self.capacity {
            board.items.pop_front();
        }
        board.items.push_back(item.clone());
        tracing::info!(id = item.id, title = %item.title, "news published");
        item
    }

    /// All retained items, oldest first.
    pub async fn list(&self) -> Vec<NewsItem> {
        self.board.read().await.items.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_assigns_increasing_ids() {
        let board = NewsBoard::new(10);
        let a = board.publish("A", "first", Utc::now()).await;
        let b = board.publish("B", "second", Utc::now()).await;

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(board.list().await.len(), 2);
    }

    #[tokio::test]
    async fn test_publish_past_capacity_drops_oldest() {
        let board = NewsBoard::new(2);
        for title in ["one", "two", "three"] {
            board.publish(title, "", Utc::now()).await;
        }

        let titles: Vec<_> = board.list().await.into_iter().map(|n| n.title).collect();

        assert_eq!(titles, vec!["two", "three"]);
    }
}
