//! Per-row outcome correlation for CSV/batch endpoints.
//!
//! # Design
//! A batch endpoint answers with one `data` entry per input row, in input
//! order, each carrying its own `responseStatus` and (when assigned) the
//! row's `id`. The envelope status only says whether the batch itself was
//! accepted — rows fail individually under an overall SUCCESS, so callers
//! inspect each outcome. No sorting or re-keying happens here; order is
//! the correlation.

use crate::error::ClientError;
use crate::model::AttributeBag;
use crate::response::{Envelope, ResponseStatus};

/// How a bulk outcome row is identified back to its input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowIdentifier {
    /// Identifier echoed (or newly assigned) by the server.
    Id(i64),
    /// 0-based input row position, used when the server sent no id.
    Row(usize),
}

/// One row of a batch operation outcome.
#[derive(Debug, Clone)]
pub struct RowOutcome {
    pub identifier: RowIdentifier,
    pub status: ResponseStatus,
    /// All row-level result fields (updated role membership, errors, ...).
    pub attributes: AttributeBag,
}

impl RowOutcome {
    pub fn is_successful(&self) -> bool {
        matches!(
            self.status,
            ResponseStatus::Success | ResponseStatus::Warning
        )
    }
}

/// Decode the envelope's `data` list into per-row outcomes, preserving
/// order. A row without a parseable `responseStatus` is a decode failure.
pub fn outcomes(envelope: &Envelope) -> Result<Vec<RowOutcome>, ClientError> {
    let bags: Vec<AttributeBag> = envelope.data_list()?;
    bags.into_iter()
        .enumerate()
        .map(|(index, attributes)| {
            let status = attributes
                .get_string("responseStatus")?
                .ok_or_else(|| {
                    ClientError::Decode(format!("bulk row {index}: missing responseStatus"))
                })
                .and_then(|s| {
                    ResponseStatus::parse(&s).ok_or_else(|| {
                        ClientError::Decode(format!(
                            "bulk row {index}: unrecognized responseStatus {s:?}"
                        ))
                    })
                })?;
            let identifier = match attributes.get_long("id") {
                Ok(Some(id)) => RowIdentifier::Id(id),
                _ => RowIdentifier::Row(index),
            };
            Ok(RowOutcome {
                identifier,
                status,
                attributes,
            })
        })
        .collect()
}

/// Pair input row N with outcome N. Fails when the counts differ — which
/// also covers a rejected batch (FAILURE envelope, empty `data`) zipped
/// against a non-empty input; check the envelope status first.
pub fn zip_rows<'a, R>(
    rows: &'a [R],
    envelope: &Envelope,
) -> Result<Vec<(&'a R, RowOutcome)>, ClientError> {
    let outcomes = outcomes(envelope)?;
    if outcomes.len() != rows.len() {
        return Err(ClientError::Decode(format!(
            "batch returned {} outcomes for {} input rows",
            outcomes.len(),
            rows.len()
        )));
    }
    Ok(rows.iter().zip(outcomes).collect())
}
