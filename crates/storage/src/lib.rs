pub mod audit;
pub mod coordinator;
pub mod loader;
pub mod records;
pub mod store;

pub use audit::{AuditEntry, AuditSink, LogAuditSink, MemoryAuditSink};
pub use coordinator::{PersistSummary, StateCoordinator, StatementOutcome};
pub use loader::Loader;
pub use records::{EnrichmentRecord, StatementRow, TransactionRow};
pub use store::{fetch, put, InMemoryRowStore, RowStore, StoreError};
