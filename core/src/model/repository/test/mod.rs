use chrono::SubsecRound;

use super::db;

pub mod analytics;
pub mod site_config;
pub mod tag;
pub mod util;

pub fn utc_now_millis_zero() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now().trunc_subsecs(3)
}
