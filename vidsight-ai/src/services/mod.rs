//! Analysis services

pub mod demo_engine;
pub mod object_aggregator;
pub mod request_validator;
pub mod segment_enricher;
pub mod stage_orchestrator;

pub use object_aggregator::{sampling_stride, ObjectAggregator};
pub use request_validator::{validate_request, ExecutionMode};
pub use stage_orchestrator::AnalysisOrchestrator;
