//! Chunked submission of a rendered batch
//!
//! Chunks go out one after another, each as a single atomic `batchUpdate`.
//! There is no rollback: when chunk `k` fails, chunks `0..k` stay applied.

use crate::error::{Error, Result};
use crate::requests::RequestBatch;
use crate::sheets::SheetsApi;

/// Largest number of requests sent in one `batchUpdate` call.
pub const DEFAULT_BATCH_SIZE: usize = 200;

#[derive(Debug, Clone, Copy)]
pub struct BatchDispatcher {
    chunk_size: usize,
}

impl Default for BatchDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchDispatcher {
    /// A zero chunk size is treated as one request per call.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of remote calls needed for `len` requests.
    pub fn chunk_count(&self, len: usize) -> usize {
        len.div_ceil(self.chunk_size)
    }

    /// Send every chunk in order, stopping at the first failure.
    pub fn dispatch<S: SheetsApi + ?Sized>(
        &self,
        sheets: &S,
        spreadsheet_id: &str,
        batch: &RequestBatch,
    ) -> Result<usize> {
        let total = self.chunk_count(batch.len());
        for (index, chunk) in batch.requests().chunks(self.chunk_size).enumerate() {
            tracing::debug!(chunk = index + 1, total, requests = chunk.len(), "sending chunk");
            sheets
                .batch_update(spreadsheet_id, chunk)
                .map_err(|e| match e {
                    Error::RemoteApi(msg) => Error::RemoteApi(format!(
                        "chunk {}/{} failed ({} earlier chunks applied): {}",
                        index + 1,
                        total,
                        index,
                        msg
                    )),
                    other => other,
                })?;
        }
        tracing::info!(
            spreadsheet_id,
            requests = batch.len(),
            chunks = total,
            "batch dispatched"
        );
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::Request;
    use std::cell::RefCell;

    struct Recorder {
        calls: RefCell<Vec<usize>>,
        fail_on: Option<usize>,
    }

    impl SheetsApi for Recorder {
        fn batch_update(&self, _id: &str, requests: &[Request]) -> Result<()> {
            let call = self.calls.borrow().len();
            if self.fail_on == Some(call) {
                return Err(Error::RemoteApi("quota exceeded".to_string()));
            }
            self.calls.borrow_mut().push(requests.len());
            Ok(())
        }

        fn read_values(&self, _id: &str, _range: &str) -> Result<Vec<Vec<String>>> {
            Ok(Vec::new())
        }
    }

    fn batch_of(n: usize) -> RequestBatch {
        let mut batch = RequestBatch::new();
        for i in 0..n {
            batch.insert_rows(0, i + 1);
        }
        batch
    }

    #[test]
    fn test_chunks_of_200() {
        let recorder = Recorder {
            calls: RefCell::new(Vec::new()),
            fail_on: None,
        };
        let sent = BatchDispatcher::default()
            .dispatch(&recorder, "doc", &batch_of(450))
            .unwrap();
        assert_eq!(sent, 3);
        assert_eq!(*recorder.calls.borrow(), vec![200, 200, 50]);
    }

    #[test]
    fn test_empty_batch_sends_nothing() {
        let recorder = Recorder {
            calls: RefCell::new(Vec::new()),
            fail_on: None,
        };
        let sent = BatchDispatcher::new(10)
            .dispatch(&recorder, "doc", &RequestBatch::new())
            .unwrap();
        assert_eq!(sent, 0);
        assert!(recorder.calls.borrow().is_empty());
    }

    #[test]
    fn test_failure_stops_after_applied_chunks() {
        let recorder = Recorder {
            calls: RefCell::new(Vec::new()),
            fail_on: Some(1),
        };
        let err = BatchDispatcher::new(2)
            .dispatch(&recorder, "doc", &batch_of(5))
            .unwrap_err();
        assert_eq!(*recorder.calls.borrow(), vec![2]);
        assert_eq!(err.status(), 500);
        assert!(err.to_string().contains("chunk 2/3"));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn test_zero_chunk_size_is_clamped() {
        assert_eq!(BatchDispatcher::new(0).chunk_size(), 1);
        assert_eq!(BatchDispatcher::new(0).chunk_count(3), 3);
    }
}
