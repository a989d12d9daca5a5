//! [`User`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl Database<Insert<user::New>> for Postgres {
    type Ok = Option<user::Id>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(new): Insert<user::New>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO users (login, password_hash) \
            VALUES ($1::VARCHAR, $2::VARCHAR) \
            ON CONFLICT (login) DO NOTHING \
            RETURNING id";
        Ok(self
            .query_opt(SQL, &[&new.login, &new.password_hash])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| row.get("id")))
    }
}

impl Database<Select<By<Option<User>, user::Login>>> for Postgres {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Login>>,
    ) -> Result<Self::Ok, Self::Err> {
        let login = by.into_inner();

        const SQL: &str = "\
            SELECT id, login, password_hash \
            FROM users \
            WHERE login = $1::VARCHAR \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&login])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| User {
                id: row.get("id"),
                login: row.get("login"),
                password_hash: row.get("password_hash"),
            }))
    }
}
