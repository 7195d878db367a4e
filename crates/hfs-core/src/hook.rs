//! Pre-write hooks
//!
//! A hook inspects (and may transform) the dataframe right before it is
//! persisted. Failing the hook aborts the write. The schema-compatibility check
//! is the hook every historical write carries.

use async_trait::async_trait;

use crate::{DataFrame, Result};

#[async_trait]
pub trait PreWriteHook<F: DataFrame>: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Runs the hook, returning the frame to write
    async fn run(&self, frame: F) -> Result<F>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnExpr, Error};

    #[derive(Clone)]
    struct RowsFrame(u64);

    #[async_trait]
    impl DataFrame for RowsFrame {
        fn column_names(&self) -> Vec<String> {
            vec![]
        }

        fn with_column(&self, _name: &str, _expr: &ColumnExpr) -> Result<Self> {
            Ok(self.clone())
        }

        fn repartition(&self, _columns: &[&str], _num_partitions: usize) -> Result<Self> {
            Ok(self.clone())
        }

        fn num_partitions(&self) -> usize {
            1
        }

        async fn count(&self) -> Result<u64> {
            Ok(self.0)
        }
    }

    struct RejectEmpty;

    #[async_trait]
    impl PreWriteHook<RowsFrame> for RejectEmpty {
        fn name(&self) -> &str {
            "reject_empty"
        }

        async fn run(&self, frame: RowsFrame) -> Result<RowsFrame> {
            if frame.count().await? == 0 {
                return Err(Error::invalid_input("refusing to write an empty frame"));
            }
            Ok(frame)
        }
    }

    #[tokio::test]
    async fn test_hook_passes_frame_through_or_fails() {
        let hook = RejectEmpty;
        assert_eq!(hook.run(RowsFrame(3)).await.unwrap().0, 3);
        assert!(matches!(
            hook.run(RowsFrame(0)).await,
            Err(Error::InvalidInput(_))
        ));
    }
}
