//! Data model shared by the Linix load pipeline crates.

pub mod error;
pub mod processing;
pub mod record;
pub mod run;

pub use error::{RecordError, Result, RunContextError};
pub use processing::{
    CANONICAL_ARTIFACT_NAME, DOCUMENTS_ARTIFACT_NAME, EnrichmentOutputs, IngestionMode,
    NormalizationResult, SAVINGS_ARTIFACT_NAME,
};
pub use record::{CanonicalRecord, REQUIRED_COLUMNS, RecordField};
pub use run::RunContext;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_result_keeps_order() {
        let records = vec![
            CanonicalRecord::new("1", "10", "6", "01012024").unwrap(),
            CanonicalRecord::new("2", "20", "12", "02012024").unwrap(),
        ];
        let result = NormalizationResult::new(
            CANONICAL_ARTIFACT_NAME.into(),
            records,
            IngestionMode::Spreadsheet,
        );
        let ids: Vec<_> = result
            .records()
            .iter()
            .map(CanonicalRecord::identity_number)
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(result.mode(), IngestionMode::Spreadsheet);
    }

    #[test]
    fn record_serializes() {
        let record = CanonicalRecord::new("1", "10", "6", "01012024").unwrap();
        let json = serde_json::to_string(&record).expect("serialize record");
        assert!(json.contains("\"request_date\":\"01012024\""));
    }
}
