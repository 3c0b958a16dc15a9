//! Discovery of leftover views.

use log::info;

use super::scope::TransactionScope;
use crate::error::{Result, SweepError};
use crate::store::{Dialect, RemovableObject, Session};

/// List the leftover views currently visible through `session`.
///
/// The listing is committed straight away on transactional backends so no
/// read lock survives into the deletion phase. Any failure is fatal: without
/// a candidate list there is nothing to plan.
pub fn discover<S>(session: &mut S, dialect: &dyn Dialect, schema: Option<&str>) -> Result<Vec<RemovableObject>>
where
    S: Session + ?Sized,
{
    let query = dialect.leftover_views_query(schema);
    info!("Executing statement to get views: {}", query);

    let mut scope =
        TransactionScope::begin(session, dialect.supports_commit_and_rollback()).map_err(SweepError::Discovery)?;
    let views = scope.query_objects(&query).map_err(SweepError::Discovery)?;
    scope.commit().map_err(SweepError::Discovery)?;

    info!("Found {} leftover view(s) using {} dialect", views.len(), dialect.name());
    Ok(views)
}
