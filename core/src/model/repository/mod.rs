pub mod analytics;
pub mod db;
pub mod db_entity;
pub mod image;
pub mod project;
#[allow(non_snake_case)]
mod schema;
pub mod session;
pub mod site_config;
pub mod tag;
#[cfg(test)]
mod test;
pub mod user;

#[macro_export()]
macro_rules! interact {
    ($conn:ident, $block:expr) => {
        tracing::Instrument::in_current_span(<_ as futures::TryFutureExt>::map_err(
            $conn.interact::<_, eyre::Result<_>>($block),
            |err| match err {
                deadpool_diesel::InteractError::Panic(_) => {
                    eyre::eyre!("database interaction panicked")
                }
                deadpool_diesel::InteractError::Aborted => {
                    eyre::eyre!("database interaction was aborted")
                }
            },
        ))
    };
}

/// A lookup by id matched no row. Returned inside an `eyre::Report` so
/// callers can tell it apart from other failures with `downcast_ref`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

impl NotFoundError {
    pub fn new(entity: &'static str, id: impl ToString) -> NotFoundError {
        NotFoundError {
            entity,
            id: id.to_string(),
        }
    }
}

/// true if `report` or anything it wraps is a `NotFoundError`
pub fn is_not_found(report: &eyre::Report) -> bool {
    report.downcast_ref::<NotFoundError>().is_some()
        || report
            .chain()
            .any(|err| err.downcast_ref::<NotFoundError>().is_some())
}
