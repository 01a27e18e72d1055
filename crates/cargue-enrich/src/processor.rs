//! Sequential per-record enrichment.

use std::fs;
use std::path::Path;
use std::time::Instant;

use cargue_model::{
    CanonicalRecord, DOCUMENTS_ARTIFACT_NAME, EnrichmentOutputs, RecordField,
    SAVINGS_ARTIFACT_NAME,
};
use cargue_output::{ArtifactEncoding, stage_nullable_rows};
use tracing::{debug, info, info_span, warn};

use crate::error::{EnrichError, Result};
use crate::session::{ProcedureConnector, ProcedureNames, ProcedureSession, ResultRow};

/// Calls both enrichment procedures for every record over a single session.
pub struct BatchEnrichmentProcessor {
    connector: Box<dyn ProcedureConnector>,
    names: ProcedureNames,
    encoding: ArtifactEncoding,
}

impl BatchEnrichmentProcessor {
    pub fn new(connector: Box<dyn ProcedureConnector>) -> Self {
        Self {
            connector,
            names: ProcedureNames::default(),
            encoding: ArtifactEncoding::default(),
        }
    }

    #[must_use]
    pub fn with_procedure_names(mut self, names: ProcedureNames) -> Self {
        self.names = names;
        self
    }

    #[must_use]
    pub fn with_encoding(mut self, encoding: ArtifactEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn procedure_names(&self) -> &ProcedureNames {
        &self.names
    }

    /// Runs the batch and writes `documentos_soporte.csv` and `ahorros.csv`.
    ///
    /// Records are processed in order, documents before savings for each. The first failing
    /// call aborts the batch and no artifact is written; both files are encoded before either is
    /// moved into place. The session is closed on every path.
    pub fn run(&self, records: &[CanonicalRecord], output_dir: &Path) -> Result<EnrichmentOutputs> {
        let args = records
            .iter()
            .enumerate()
            .map(|(index, record)| procedure_args(index, record))
            .collect::<Result<Vec<_>>>()?;

        let span = info_span!("enrich", records = records.len());
        let _guard = span.enter();
        let start = Instant::now();

        let mut session = self
            .connector
            .connect()
            .map_err(|source| EnrichError::Connect { source })?;
        let fetched = self.call_all(session.as_mut(), records, &args);
        if let Err(err) = session.close() {
            warn!(error = %err, "failed to close database session");
        }
        let (documents, savings) = fetched?;

        let documents_file = output_dir.join(DOCUMENTS_ARTIFACT_NAME);
        let savings_file = output_dir.join(SAVINGS_ARTIFACT_NAME);
        let staged_documents = stage_nullable_rows(&documents_file, &documents, self.encoding)?;
        let staged_savings = stage_nullable_rows(&savings_file, &savings, self.encoding)?;
        staged_documents.persist()?;
        if let Err(err) = staged_savings.persist() {
            if let Err(cleanup) = fs::remove_file(&documents_file) {
                warn!(path = %documents_file.display(), error = %cleanup, "failed to remove documents artifact");
            }
            return Err(err.into());
        }

        info!(
            documents = %documents_file.display(),
            savings = %savings_file.display(),
            document_rows = documents.len(),
            savings_rows = savings.len(),
            duration_ms = start.elapsed().as_millis(),
            "enrichment complete"
        );
        Ok(EnrichmentOutputs {
            documents_file,
            savings_file,
            document_rows: documents.len(),
            savings_rows: savings.len(),
        })
    }

    fn call_all(
        &self,
        session: &mut dyn ProcedureSession,
        records: &[CanonicalRecord],
        args: &[(i64, i64)],
    ) -> Result<(Vec<ResultRow>, Vec<ResultRow>)> {
        let mut documents = Vec::new();
        let mut savings = Vec::new();
        for (index, (record, &(identity, amount))) in records.iter().zip(args).enumerate() {
            for (procedure, sink) in [
                (&self.names.documents, &mut documents),
                (&self.names.savings, &mut savings),
            ] {
                let rows = session
                    .call_procedure(procedure, identity, amount)
                    .map_err(|source| EnrichError::Procedure {
                        procedure: procedure.clone(),
                        identity: record.identity_number().to_string(),
                        source,
                    })?;
                debug!(record = index, procedure = %procedure, rows = rows.len(), "procedure called");
                sink.extend(rows);
            }
        }
        Ok((documents, savings))
    }
}

fn procedure_args(index: usize, record: &CanonicalRecord) -> Result<(i64, i64)> {
    let parse = |field: RecordField| {
        let value = record.field(field);
        value
            .parse::<i64>()
            .map_err(|_| EnrichError::InvalidRecord {
                index,
                field,
                value: value.to_string(),
            })
    };
    Ok((
        parse(RecordField::IdentityNumber)?,
        parse(RecordField::Amount)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse_integers() {
        let record = CanonicalRecord::new("12345678", "500000", "12", "15032024").unwrap();
        assert_eq!(procedure_args(0, &record).unwrap(), (12345678, 500000));
    }

    #[test]
    fn args_reject_kept_text() {
        let record = CanonicalRecord::new("N/A", "500000", "12", "15032024").unwrap();
        let err = procedure_args(3, &record).unwrap_err();
        assert!(matches!(
            err,
            EnrichError::InvalidRecord {
                index: 3,
                field: RecordField::IdentityNumber,
                ..
            }
        ));
    }
}
