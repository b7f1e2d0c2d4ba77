use augeo_core::WorkingRecord;

use crate::store::StoreError;

/// Supplies the working records for one batch run.
///
/// Contract: the loader yields records for every statement currently
/// eligible (status `new`), in a deterministic order the engine preserves
/// end to end, and it has already transitioned each such statement to
/// `processing` before handing its transactions over. The engine never
/// re-sorts what the loader produced.
///
/// Concrete loaders are collaborator code (file feeds, queue consumers,
/// store scans) and live outside this workspace.
pub trait Loader {
    fn load(&mut self) -> Result<Vec<WorkingRecord>, StoreError>;
}
