use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, accounts, categories, notifications, recurring_payments,
    savings_goals, transactions, users,
};

use super::Engine;

/// Generates a `require_*` lookup for an entity carrying a `user_id` column.
///
/// Missing rows and rows owned by another user are reported the same way.
macro_rules! impl_require_owned {
    ($require_fn:ident, $entity:path, $model:path, $user_col:expr, $err_msg:literal) => {
        pub(super) async fn $require_fn(
            &self,
            db: &DatabaseTransaction,
            id: Uuid,
            user_id: Uuid,
        ) -> ResultEngine<$model> {
            <$entity>::find_by_id(id)
                .filter($user_col.eq(user_id))
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))
        }
    };
}

impl Engine {
    impl_require_owned!(
        require_account,
        accounts::Entity,
        accounts::Model,
        accounts::Column::UserId,
        "account not exists"
    );

    impl_require_owned!(
        require_category,
        categories::Entity,
        categories::Model,
        categories::Column::UserId,
        "category not exists"
    );

    impl_require_owned!(
        require_recurring_payment,
        recurring_payments::Entity,
        recurring_payments::Model,
        recurring_payments::Column::UserId,
        "recurring payment not exists"
    );

    impl_require_owned!(
        require_goal,
        savings_goals::Entity,
        savings_goals::Model,
        savings_goals::Column::UserId,
        "savings goal not exists"
    );

    impl_require_owned!(
        require_notification,
        notifications::Entity,
        notifications::Model,
        notifications::Column::UserId,
        "notification not exists"
    );

    /// Transactions are owned through their account.
    pub(super) async fn require_transaction(
        &self,
        db: &DatabaseTransaction,
        transaction_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<transactions::Model> {
        transactions::Entity::find_by_id(transaction_id)
            .inner_join(accounts::Entity)
            .filter(accounts::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))
    }

    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    /// Checks the optional category and recurring payment references of a
    /// transaction or recurring payment.
    pub(super) async fn require_optional_refs(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
        category_id: Option<Uuid>,
        recurring_payment_id: Option<Uuid>,
    ) -> ResultEngine<Option<recurring_payments::Model>> {
        if let Some(category_id) = category_id {
            self.require_category(db, category_id, user_id).await?;
        }
        match recurring_payment_id {
            Some(id) => Ok(Some(self.require_recurring_payment(db, id, user_id).await?)),
            None => Ok(None),
        }
    }
}
