use async_trait::async_trait;
use hfs_core::{Error, PreWriteHook, Result};
use tracing::{debug, warn};

use crate::{ArrowFrame, LocalEngine};

/// Rejects frames whose columns do not exist in the target table
///
/// A column is compatible when the existing table has a field with the same
/// name, data type and nullability. Files of one table must agree on all
/// three to be read back together. Writing to a table that does not exist
/// yet always passes.
#[derive(Debug, Clone)]
pub struct SchemaCompatibilityHook {
    engine: LocalEngine,
    table_name: String,
    database: String,
}

impl SchemaCompatibilityHook {
    pub fn new(engine: LocalEngine, table_name: &str, database: &str) -> Self {
        Self {
            engine,
            table_name: table_name.to_string(),
            database: database.to_string(),
        }
    }

    pub fn qualified_table_name(&self) -> String {
        format!("{}.{}", self.database, self.table_name)
    }
}

#[async_trait]
impl PreWriteHook<ArrowFrame> for SchemaCompatibilityHook {
    fn name(&self) -> &str {
        "schema_compatibility"
    }

    async fn run(&self, frame: ArrowFrame) -> Result<ArrowFrame> {
        let table = self.qualified_table_name();
        let Some(entry) = self.engine.table(&table)? else {
            debug!(table = %table, "Target table does not exist yet, schema check skipped");
            return Ok(frame);
        };

        let incompatible: Vec<String> = frame
            .schema()
            .fields()
            .iter()
            .filter(|field| match entry.schema.field_with_name(field.name()) {
                Ok(existing) => {
                    existing.data_type() != field.data_type()
                        || existing.is_nullable() != field.is_nullable()
                }
                Err(_) => true,
            })
            .map(|field| field.name().to_string())
            .collect();

        if incompatible.is_empty() {
            return Ok(frame);
        }

        warn!(table = %table, columns = ?incompatible, "Incoming columns do not match the table schema");
        Err(Error::SchemaIncompatible {
            table,
            columns: incompatible,
        })
    }
}
