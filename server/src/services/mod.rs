pub mod audit_ingest;

pub use audit_ingest::{AuditIngestService, IngestError, IngestOutcome};
