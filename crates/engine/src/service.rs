use augeo_core::{BatchResult, EngineConfig};
use augeo_pipeline::{BatchRunner, Pipeline};
use augeo_storage::{
    AuditSink, Loader, PersistSummary, RowStore, StateCoordinator, StoreError,
};

/// Everything one run produced: the pipeline-side accounting and the
/// persistence-side accounting, in one value.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub batch: BatchResult,
    pub persistence: PersistSummary,
}

/// The invocation surface for a surrounding scheduler: wires Loader →
/// Batch Runner → State Coordinator into a single call.
///
/// One service instance assumes exclusive ownership of the statements its
/// loader yields; concurrent runs over the same statements need external
/// mutual exclusion.
pub struct EnrichmentService<'a> {
    pipeline: &'a Pipeline,
    coordinator: StateCoordinator<'a>,
}

impl<'a> EnrichmentService<'a> {
    pub fn new(
        pipeline: &'a Pipeline,
        store: &'a dyn RowStore,
        audit: &'a dyn AuditSink,
        config: EngineConfig,
    ) -> Self {
        EnrichmentService {
            pipeline,
            coordinator: StateCoordinator::new(store, audit, config),
        }
    }

    /// Load, enrich, persist. The only fallible part is loading; once
    /// records are in hand, both the runner and the coordinator contain
    /// their failures and always return full accounting.
    pub fn run(&self, loader: &mut dyn Loader) -> Result<RunSummary, StoreError> {
        let mut records = loader.load()?;
        tracing::info!(records = records.len(), "enrichment run starting");

        let batch = BatchRunner::new(self.pipeline).run(&mut records);
        let persistence = self.coordinator.persist_batch(&records, &batch);

        Ok(RunSummary { batch, persistence })
    }
}
