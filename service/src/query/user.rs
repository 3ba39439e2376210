//! [`Query`] collection related to a single [`User`].

use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::database,
    Service,
};

use super::{users, Query};

/// Queries a [`User`] by its [`user::Id`].
#[derive(Clone, Debug)]
pub struct ById(pub user::Id);

impl<Db> Query<ById> for Service<Db>
where
    Self: Query<users::ByIds, Ok = Vec<User>, Err = Traced<database::Error>>,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(&self, ById(id): ById) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .execute(users::ByIds(vec![id.clone()]))
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .find(|u| u.id == id))
    }
}
