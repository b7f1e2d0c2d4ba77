pub mod config;
pub mod record;
pub mod result;
pub mod status;

pub use config::{Collections, ConfigError, EngineConfig};
pub use record::{FieldValue, SourceType, WorkingRecord};
pub use result::{BatchResult, PipelineResult, StepOutcome, StepResult};
pub use status::{
    EnrichmentStatus, PairingStatus, RecordStatus, StatementStatus, TransactionStatus, UNKNOWN,
    UNMATCHED,
};
