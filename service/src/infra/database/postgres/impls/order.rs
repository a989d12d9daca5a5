//! [`Order`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{order, user, Order},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl Database<Insert<order::New>> for Postgres {
    type Ok = order::Ownership;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(new): Insert<order::New>,
    ) -> Result<Self::Ok, Self::Err> {
        const INSERT_SQL: &str = "\
            INSERT INTO orders (number, user_id, status) \
            VALUES ($1::VARCHAR, $2::INT8, $3::VARCHAR) \
            ON CONFLICT (number) DO NOTHING";
        let inserted = self
            .exec(INSERT_SQL, &[&new.number, &new.owner_id, &order::Status::New])
            .await
            .map_err(tracerr::wrap!())?;
        if inserted > 0 {
            return Ok(order::Ownership {
                owner_id: new.owner_id,
                created: true,
            });
        }

        // Separate statement, so it sees the row committed by a concurrent
        // winner of the conflict.
        const OWNER_SQL: &str = "\
            SELECT user_id \
            FROM orders \
            WHERE number = $1::VARCHAR";
        let row = self
            .query_one(OWNER_SQL, &[&new.number])
            .await
            .map_err(tracerr::wrap!())?;
        Ok(order::Ownership {
            owner_id: row.get("user_id"),
            created: false,
        })
    }
}

impl Database<Select<By<Vec<Order>, user::Id>>> for Postgres {
    type Ok = Vec<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Order>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let owner_id = by.into_inner();

        const SQL: &str = "\
            SELECT number, user_id, status, accrual, uploaded_at \
            FROM orders \
            WHERE user_id = $1::INT8 \
            ORDER BY uploaded_at DESC";
        Ok(self
            .query(SQL, &[&owner_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| Order {
                number: row.get("number"),
                owner_id: row.get("user_id"),
                status: row.get("status"),
                accrual: row.get("accrual"),
                uploaded_at: row.get("uploaded_at"),
            })
            .collect())
    }
}
