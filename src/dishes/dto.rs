use serde::Serialize;

use super::repo_types::DishShortInfo;

#[derive(Debug, Serialize)]
pub struct Recommendations {
    pub dishes: Vec<DishShortInfo>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Serialize)]
pub struct RecommendationTotal {
    pub total: i64,
}
