use crate::error::Error;

/// Per-item outcomes of a bulk operation
///
/// Bulk work is not transactional: items that succeeded stay committed
/// even when others failed.
#[derive(Debug)]
pub struct BatchResult<T> {
    pub outcomes: Vec<Result<T, Error>>,
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        Self {
            outcomes: Vec::new(),
        }
    }
}

impl<T> From<Vec<Result<T, Error>>> for BatchResult<T> {
    fn from(outcomes: Vec<Result<T, Error>>) -> Self {
        Self { outcomes }
    }
}

impl<T> BatchResult<T> {
    pub fn succeeded(&self) -> impl Iterator<Item = &T> {
        self.outcomes.iter().filter_map(|o| o.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &Error> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err())
    }

    pub fn success_count(&self) -> usize {
        self.succeeded().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Every item succeeded (trivially true for an empty batch)
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(Result::is_ok)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Successful values, or the first failure
    pub fn into_result(self) -> Result<Vec<T>, Error> {
        self.outcomes.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_batch() {
        let batch: BatchResult<u32> = vec![Ok(1), Err(Error::internal("boom")), Ok(3)].into();
        assert_eq!(batch.success_count(), 2);
        assert_eq!(batch.failure_count(), 1);
        assert!(!batch.is_complete());
        assert_eq!(batch.succeeded().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert!(batch.into_result().is_err());
    }

    #[test]
    fn test_empty_batch_is_complete() {
        let batch = BatchResult::<u32>::default();
        assert!(batch.is_complete());
        assert!(batch.is_empty());
        assert_eq!(batch.into_result().unwrap(), Vec::<u32>::new());
    }
}
