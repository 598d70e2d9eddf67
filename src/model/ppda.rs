//! Pollution prevention plan (PPDA) records and patch payloads.
use serde::{Deserialize, Serialize};

/// A prevention plan owned by exactly one institution.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Ppda {
    pub id_ppda: String,
    pub id_institution: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Partial update for a plan. Moving a plan to another institution is the
/// one mutation here; the RBAC gate must clear both the current and the
/// target institution before it is applied.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PpdaPatch {
    pub id_institution: Option<String>,
}
