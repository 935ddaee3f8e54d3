//! Count ledger: the bounded FIFO of per-document line counts
//!
//! The feeder pushes one count per document, the reassembler pops them in the
//! same order. Pushing blocks while `capacity` documents are in flight, which
//! is the pipeline's only throttle. Dropping or closing the writer marks the
//! ledger complete: `pop` drains what is left and then returns `None`.

use tokio::sync::mpsc;

/// Create a ledger holding at most `capacity` counts.
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn count_ledger(capacity: usize) -> (LedgerWriter, LedgerReader) {
    let (tx, rx) = mpsc::channel(capacity);
    (LedgerWriter { tx }, LedgerReader { rx })
}

/// The reading side went away; no further counts will ever be consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("count ledger closed by reader")]
pub struct LedgerClosed;

/// Feeder side of the ledger
#[derive(Debug)]
pub struct LedgerWriter {
    tx: mpsc::Sender<usize>,
}

impl LedgerWriter {
    /// Push a count, waiting while the ledger is at capacity
    pub async fn push(&self, count: usize) -> Result<(), LedgerClosed> {
        self.tx.send(count).await.map_err(|_| LedgerClosed)
    }

    /// Counts pushed but not yet popped
    pub fn in_flight(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Signal that no more counts will be pushed
    pub fn close(self) {
        drop(self);
    }
}

/// Reassembler side of the ledger
#[derive(Debug)]
pub struct LedgerReader {
    rx: mpsc::Receiver<usize>,
}

impl LedgerReader {
    /// Next count in push order; `None` once the ledger is complete and empty
    pub async fn pop(&mut self) -> Option<usize> {
        self.rx.recv().await
    }

    /// Counts waiting to be popped
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::Rng;
    use std::time::Duration;

    #[tokio::test]
    async fn test_pop_returns_push_order_then_none() {
        let (writer, mut reader) = count_ledger(4);
        writer.push(3).await.unwrap();
        writer.push(1).await.unwrap();
        writer.push(2).await.unwrap();
        assert_eq!(writer.in_flight(), 3);
        writer.close();

        assert_eq!(reader.pop().await, Some(3));
        assert_eq!(reader.pop().await, Some(1));
        assert_eq!(reader.pop().await, Some(2));
        assert_eq!(reader.pop().await, None);
    }

    #[tokio::test]
    async fn test_empty_but_open_is_not_complete() {
        let (writer, mut reader) = count_ledger(1);
        assert!(reader.is_empty());

        let pending = tokio::time::timeout(Duration::from_millis(50), reader.pop()).await;
        assert!(pending.is_err(), "pop must wait while the writer is open");

        drop(writer);
        assert_eq!(reader.pop().await, None);
    }

    #[tokio::test]
    async fn test_push_blocks_at_capacity() {
        let (writer, mut reader) = count_ledger(2);
        writer.push(1).await.unwrap();
        writer.push(2).await.unwrap();
        assert_eq!(writer.in_flight(), 2);

        let blocked = tokio::time::timeout(Duration::from_millis(50), writer.push(3)).await;
        assert!(blocked.is_err(), "push must wait while the ledger is full");

        assert_eq!(reader.pop().await, Some(1));
        writer.push(3).await.unwrap();
        assert_eq!(reader.len(), 2);
    }

    #[tokio::test]
    async fn test_push_after_reader_dropped_fails() {
        let (writer, reader) = count_ledger(2);
        drop(reader);
        assert_eq!(writer.push(1).await, Err(LedgerClosed));
    }

    async fn run_concurrent(counts: Vec<usize>, capacity: usize) -> Vec<usize> {
        let (writer, mut reader) = count_ledger(capacity);
        let to_push = counts.clone();

        let producer = tokio::spawn(async move {
            for count in to_push {
                let delay = rand::rng().random_range(0..200);
                tokio::time::sleep(Duration::from_micros(delay)).await;
                writer.push(count).await.unwrap();
            }
        });

        let consumer = tokio::spawn(async move {
            let mut popped = Vec::new();
            while let Some(count) = reader.pop().await {
                let delay = rand::rng().random_range(0..200);
                tokio::time::sleep(Duration::from_micros(delay)).await;
                popped.push(count);
            }
            popped
        });

        producer.await.unwrap();
        consumer.await.unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_fifo_under_randomized_timing(
            counts in prop::collection::vec(1usize..50, 0..64),
            capacity in 1usize..8,
        ) {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .unwrap();
            let popped = runtime.block_on(run_concurrent(counts.clone(), capacity));
            prop_assert_eq!(popped, counts);
        }
    }
}
