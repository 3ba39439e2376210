//! [`Query`] collection related to the multiple [`User`]s.

use common::operations::By;
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::database,
    read, statement, Service,
};

use super::{DatabaseQuery, Query};

/// Queries [`User`]s matching a [`statement::Statement`].
pub type Select = DatabaseQuery<By<Vec<User>, statement::Statement>>;

/// Queries total count of [`User`]s matching a [`statement::Filter`].
pub type TotalCount =
    DatabaseQuery<By<read::user::list::TotalCount, statement::Filter>>;

/// Queries multiple [`User`]s by their [`user::Id`]s.
///
/// Unknown [`user::Id`]s are silently skipped.
#[derive(Clone, Debug)]
pub struct ByIds(pub Vec<user::Id>);

impl<Db> Query<ByIds> for Service<Db>
where
    Self: Query<Select, Ok = Vec<User>, Err = Traced<database::Error>>,
{
    type Ok = Vec<User>;
    type Err = Traced<database::Error>;

    async fn execute(&self, ByIds(ids): ByIds) -> Result<Self::Ok, Self::Err> {
        let ids = ids.into_iter().filter(|id| !id.is_empty()).collect::<Vec<_>>();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.execute(Select::by(statement::user::by_ids(&ids)))
            .await
            .map_err(tracerr::wrap!())
    }
}
