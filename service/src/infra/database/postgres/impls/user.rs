//! [`User`]-related [`Database`] implementations.

use common::operations::{By, Select};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, Field},
        User,
    },
    infra::{
        database::{
            self,
            postgres::{Connection, LikePattern},
            Postgres,
        },
        Database,
    },
    read,
    statement::{Filter, Literal, Statement},
};

impl<C> Database<Select<By<Vec<User>, Statement>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<User>, Statement>>,
    ) -> Result<Self::Ok, Self::Err> {
        let statement = by.into_inner();
        tracing::debug!(%statement, "selecting `User`s");

        let Statement {
            fields,
            filter,
            order,
            limit,
        } = statement;

        let mut ps = Params::default();
        let filter = ps.render(&filter);
        let limit = limit.map(|l| ps.push(i64::try_from(l).unwrap_or(i64::MAX)));

        let sql = format!(
            "SELECT {fields} \
             FROM users \
             WHERE {filter} \
             ORDER BY {order} \
             {limit}",
            fields = fields.iter().map(|&f| column(f)).format(", "),
            order = order.iter().format_with(", ", |(field, order), f| {
                f(&format_args!("{} {}", column(*field), order.sql()))
            }),
            limit = limit.into_iter().format_with("", |idx, f| {
                f(&format_args!("LIMIT ${idx}::INT8"))
            }),
        );
        Ok(self
            .query(&sql, &ps.refs())
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(to_user)
            .collect())
    }
}

impl<C> Database<Select<By<read::user::list::TotalCount, Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::user::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::user::list::TotalCount, Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        tracing::debug!(%filter, "counting `User`s");

        let mut ps = Params::default();
        let sql = format!(
            "SELECT COUNT(*)::INT8 \
             FROM users \
             WHERE {}",
            ps.render(&filter),
        );
        let count = self
            .query_opt(&sql, &ps.refs())
            .await
            .map_err(tracerr::wrap!())?
            .map_or(0, |row| row.get::<_, i64>(0));
        Ok(usize::try_from(count).unwrap_or_default().into())
    }
}

/// Returns the `users` table column storing the provided [`Field`].
const fn column(field: Field) -> &'static str {
    match field {
        Field::Id => "id",
        Field::FirstName => "first_name",
        Field::LastName => "last_name",
        Field::Email => "email",
        Field::Disabled => "disabled",
        Field::Domain => "domain",
        Field::Title => "title",
    }
}

/// Reads a [`User`] out of the provided [`Row`].
///
/// Columns absent from the [`Row`] or holding `NULL` fall back to defaults.
fn to_user(row: &Row) -> User {
    let text = |f| {
        row.try_get::<_, Option<String>>(column(f))
            .ok()
            .flatten()
    };
    User {
        id: user::Id::from(text(Field::Id).unwrap_or_default()),
        first_name: text(Field::FirstName).unwrap_or_default(),
        last_name: text(Field::LastName).unwrap_or_default(),
        email: text(Field::Email).unwrap_or_default(),
        disabled: row
            .try_get::<_, Option<bool>>(column(Field::Disabled))
            .ok()
            .flatten(),
        domain: text(Field::Domain),
        title: text(Field::Title),
    }
}

/// Parameters of a SQL query being rendered.
#[derive(Debug, Default)]
struct Params(Vec<Box<dyn ToSql + Sync + Send>>);

impl Params {
    /// Adds the provided parameter, returning its `$` index.
    fn push(&mut self, param: impl ToSql + Sync + Send + 'static) -> usize {
        self.0.push(Box::new(param));
        self.0.len()
    }

    /// Adds the provided [`Literal`] parameter, returning its typed
    /// placeholder.
    fn literal(&mut self, lit: &Literal) -> String {
        match lit {
            Literal::Text(s) => format!("${}::VARCHAR", self.push(s.clone())),
            Literal::Bool(b) => format!("${}::BOOL", self.push(*b)),
        }
    }

    /// Renders the provided [`Filter`] as a SQL condition, binding all its
    /// [`Literal`]s as parameters.
    fn render(&mut self, filter: &Filter) -> String {
        match filter {
            Filter::All(all) if all.is_empty() => "TRUE".to_owned(),
            Filter::Any(any) if any.is_empty() => "FALSE".to_owned(),
            Filter::All(all) => {
                let parts = all.iter().map(|f| self.render(f)).collect_vec();
                format!("({})", parts.join(" AND "))
            }
            Filter::Any(any) => {
                let parts = any.iter().map(|f| self.render(f)).collect_vec();
                format!("({})", parts.join(" OR "))
            }
            Filter::Eq(field, lit) => {
                format!("{} = {}", column(*field), self.literal(lit))
            }
            Filter::Ne(field, lit) => {
                format!("{} <> {}", column(*field), self.literal(lit))
            }
            Filter::Gt(field, lit) => {
                format!("{} > {}", column(*field), self.literal(lit))
            }
            Filter::StartsWith(field, prefix) => format!(
                "{} ILIKE ${}::VARCHAR",
                column(*field),
                self.push(LikePattern::prefix(prefix)),
            ),
            Filter::NotNull(field) => format!("{} IS NOT NULL", column(*field)),
        }
    }

    /// Returns these [`Params`] in the form accepted by a [`Connection`].
    fn refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.0
            .iter()
            .map(|p| -> &(dyn ToSql + Sync) { p.as_ref() })
            .collect()
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::user::SortKey,
        read::user::list,
        statement::{self, Filter},
    };

    use super::Params;

    #[test]
    fn binds_every_literal() {
        let mut ps = Params::default();
        let sql = ps.render(&statement::user::listing(&list::Filter::new(
            Some("John Doe"),
        )));
        assert_eq!(ps.0.len(), 8);
        assert!(sql.starts_with("(disabled = $1::BOOL AND domain IS NOT NULL"));
        assert!(sql.contains("first_name ILIKE $2::VARCHAR"));
        assert!(!sql.contains("John"));
    }

    #[test]
    fn renders_keyset_comparison() {
        let mut ps = Params::default();
        let sql = ps.render(&statement::user::after(&SortKey {
            first_name: "A".into(),
            last_name: "B".into(),
            id: "1".into(),
        }));
        assert_eq!(
            sql,
            "((first_name > $1::VARCHAR) \
             OR (first_name = $2::VARCHAR AND last_name > $3::VARCHAR) \
             OR (first_name = $4::VARCHAR AND last_name = $5::VARCHAR \
             AND id > $6::VARCHAR))",
        );
    }

    #[test]
    fn renders_empty_junctions() {
        let mut ps = Params::default();
        assert_eq!(ps.render(&Filter::always()), "TRUE");
        assert_eq!(ps.render(&Filter::Any(vec![])), "FALSE");
        assert!(ps.0.is_empty());
    }
}
