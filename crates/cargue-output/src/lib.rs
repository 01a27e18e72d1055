//! Artifact writers for the Linix load pipeline.
//!
//! Every artifact is plain delimited text, one `\n`-terminated line per row, in a configured
//! encoding. Writers keep no state between calls.

mod canonical;
mod encoding;
mod error;
mod writer;

pub use canonical::{canonical_fields, write_canonical_artifact};
pub use encoding::ArtifactEncoding;
pub use error::{OutputError, Result};
pub use writer::{
    PIPE, SPACED_PIPE, StagedArtifact, stage_delimited, stage_nullable_rows, write_delimited,
};
