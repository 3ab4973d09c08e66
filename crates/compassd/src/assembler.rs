//! Response assembly. Pure packaging, no validation.

use chrono::Utc;
use compass_common::{Diagnostics, QueryResponse, Source, ValidatedRequest};

pub fn assemble(
    request: &ValidatedRequest,
    summary: String,
    plan: Vec<String>,
    sources: Vec<Source>,
    diagnostics: Diagnostics,
) -> QueryResponse {
    QueryResponse {
        query: request.query.clone(),
        vision: request.vision.clone(),
        timestamp: Utc::now(),
        summary,
        plan,
        sources,
        diagnostics,
    }
}
