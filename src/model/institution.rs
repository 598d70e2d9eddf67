//! Institution records, the scoping entity for RBAC.
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Institution {
    pub id_institution: String,
    pub institution_name: String,
    pub created_at: i64,
    pub updated_at: i64,
}
