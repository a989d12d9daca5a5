//! In-memory [`Database`] implementation.
//!
//! Keeps everything in a single process, so is suitable for tests and local
//! experiments only.

use std::sync::{Arc, Mutex, MutexGuard};

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use derive_more::{Display, Error as StdError};
use tracerr::Traced;

use crate::{
    domain::{order, user, Order, User},
    infra::{database, Database},
};

/// In-memory [`Database`].
///
/// Clones share the same storage.
#[derive(Clone, Debug, Default)]
pub struct Memory(Arc<Mutex<Storage>>);

/// Data stored in a [`Memory`] database.
#[derive(Debug, Default)]
struct Storage {
    /// Stored [`User`]s, ordered by their IDs.
    users: Vec<User>,

    /// Stored [`Order`]s, in their insertion order.
    orders: Vec<Order>,
}

impl Memory {
    /// Locks the [`Storage`] of this [`Memory`] database.
    fn lock(&self) -> Result<MutexGuard<'_, Storage>, Traced<database::Error>> {
        self.0
            .lock()
            .map_err(|_| tracerr::new!(Error))
            .map_err(tracerr::map_from)
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
#[display("`Memory` database is poisoned by a panicked holder")]
pub struct Error;

impl Database<Insert<user::New>> for Memory {
    type Ok = Option<user::Id>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(new): Insert<user::New>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut storage = self.lock().map_err(tracerr::wrap!())?;
        if storage.users.iter().any(|u| u.login == new.login) {
            return Ok(None);
        }

        let id = user::Id::from(
            storage.users.last().map_or(0, |u| i64::from(u.id)) + 1,
        );
        storage.users.push(User {
            id,
            login: new.login,
            password_hash: new.password_hash,
        });
        Ok(Some(id))
    }
}

impl Database<Select<By<Option<User>, user::Login>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Login>>,
    ) -> Result<Self::Ok, Self::Err> {
        let login = by.into_inner();
        Ok(self
            .lock()
            .map_err(tracerr::wrap!())?
            .users
            .iter()
            .find(|u| u.login == login)
            .cloned())
    }
}

impl Database<Insert<order::New>> for Memory {
    type Ok = order::Ownership;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(new): Insert<order::New>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut storage = self.lock().map_err(tracerr::wrap!())?;
        if let Some(existing) =
            storage.orders.iter().find(|o| o.number == new.number)
        {
            return Ok(order::Ownership {
                owner_id: existing.owner_id,
                created: false,
            });
        }

        storage.orders.push(Order {
            number: new.number,
            owner_id: new.owner_id,
            status: order::Status::New,
            accrual: None,
            uploaded_at: DateTime::now().coerce(),
        });
        Ok(order::Ownership {
            owner_id: new.owner_id,
            created: true,
        })
    }
}

impl Database<Select<By<Vec<Order>, user::Id>>> for Memory {
    type Ok = Vec<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Order>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let owner_id = by.into_inner();
        let mut orders = self
            .lock()
            .map_err(tracerr::wrap!())?
            .orders
            .iter()
            .rev()
            .filter(|o| o.owner_id == owner_id)
            .cloned()
            .collect::<Vec<_>>();
        // Stable, so ties keep the latest insertion first.
        orders.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(orders)
    }
}
