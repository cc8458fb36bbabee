//! Postgres [`Database`] implementation.

mod impls;

use deadpool_postgres::Runtime;
use derive_more::{Display, Error as StdError, From};
use tokio_postgres::{types::ToSql, NoTls, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database;
#[cfg(doc)]
use crate::infra::Database;

pub use deadpool_postgres::{
    Client as Connection, Config, CreatePoolError as PoolCreationError, Pool,
    PoolError,
};
pub use refinery::embed_migrations;

/// Postgres [`Database`] client.
#[derive(Clone, Debug)]
pub struct Postgres(Pool);

impl Postgres {
    /// Creates a new [`Postgres`] client with the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If failed to create a new [`Postgres`] client.
    pub fn new(conf: &Config) -> Result<Self, Traced<database::Error>> {
        let pool = conf
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        Ok(Self(pool))
    }

    /// Returns a [`Connection`] from the underlying [`Pool`].
    pub(crate) async fn connection(
        &self,
    ) -> Result<Connection, Traced<database::Error>> {
        self.0
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }

    /// Executes the provided statement, returning the resulting [`Row`]s.
    pub(crate) async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .query(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }

    /// Executes the provided statement, returning at most one [`Row`].
    pub(crate) async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .query_opt(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }

    /// Executes the provided statement, returning the number of affected
    /// rows.
    pub(crate) async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .execute(stmt, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }
}

/// Postgres database [`Error`].
#[derive(Debug, Display, StdError, From)]
pub enum Error {
    /// [`Connection`] error.
    #[display("`Connection` error: {_0}")]
    Connection(tokio_postgres::Error),

    /// Error of creating a new connection [`Pool`].
    #[display("Failed to create a new connection `Pool`: {_0}")]
    PoolCreationError(PoolCreationError),

    /// Connection [`Pool`] error.
    #[display("Connection `Pool` error: {_0}")]
    PoolError(PoolError),
}
