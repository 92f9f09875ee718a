pub mod collectors;
pub mod pipeline;
pub mod run_log;
pub mod scheduler;
pub mod verifier;

pub use pipeline::{IngestPipeline, PipelineParts};
pub use run_log::{RunReport, Step, StepOutcome};
pub use scheduler::{start_ingest_interval, ScheduleConfig, SchedulerHandle};
pub use verifier::{BulkVerifier, VerifyStats};
