//! [`Query`] collecting [`Order`]s.

use common::operations::By;

#[cfg(doc)]
use crate::{domain::User, Query};
use crate::domain::{user, Order};

use super::DatabaseQuery;

/// [`Query`] collecting all the [`Order`]s uploaded by the [`User`] with the
/// provided ID, the most recently uploaded first.
pub type ByOwner = DatabaseQuery<By<Vec<Order>, user::Id>>;

#[cfg(test)]
mod spec {
    use common::Handler as _;

    use crate::{
        command::SubmitOrder,
        domain::user,
        infra::Memory,
        test_service,
    };

    use super::ByOwner;

    #[tokio::test]
    async fn empty_for_user_without_orders() {
        let svc = test_service(Memory::default());

        let orders = svc.execute(ByOwner::by(user::Id::from(1))).await.unwrap();

        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn lists_own_orders_newest_first() {
        let svc = test_service(Memory::default());
        for (user_id, number) in [
            (1, "79927398713"),
            (2, "18"),
            (1, "12345678903"),
            (1, "4561261212345467"),
        ] {
            _ = svc
                .execute(SubmitOrder {
                    user_id: user::Id::from(user_id),
                    number: number.to_owned(),
                })
                .await
                .unwrap();
        }

        let orders = svc.execute(ByOwner::by(user::Id::from(1))).await.unwrap();

        assert_eq!(
            orders.iter().map(|o| o.number.as_ref()).collect::<Vec<_>>(),
            ["4561261212345467", "12345678903", "79927398713"],
        );
        assert!(orders
            .windows(2)
            .all(|w| w[0].uploaded_at >= w[1].uploaded_at));
        assert!(orders.iter().all(|o| o.owner_id == user::Id::from(1)));
    }
}
