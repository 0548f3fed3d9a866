use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::criteria::SearchCriteria;

/// Request to save a CMA search
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCmaRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: String,
    pub criteria: SearchCriteria,
}

/// Request to rename or re-scope a saved CMA search
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCmaRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: Option<String>,
    pub criteria: Option<SearchCriteria>,
}
