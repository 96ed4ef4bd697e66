use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Category, CreateCategoryCmd, EngineError, ResultEngine, UpdateCategoryCmd, categories,
    recurring_payments, transactions,
    util::{fold_text, normalize_required_name},
};

use super::{Engine, with_tx};

fn validate_budget_share(pct: Option<f64>) -> ResultEngine<()> {
    match pct {
        Some(pct) if !(0.0..=100.0).contains(&pct) => Err(EngineError::field(
            "budget_share_pct",
            "must be between 0 and 100",
        )),
        _ => Ok(()),
    }
}

impl Engine {
    async fn ensure_category_name_free(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::NameNorm.eq(fold_text(name)));
        if let Some(id) = except {
            query = query.filter(categories::Column::Id.ne(id));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }

    pub async fn create_category(
        &self,
        user_id: Uuid,
        cmd: CreateCategoryCmd,
    ) -> ResultEngine<Category> {
        let name = normalize_required_name(&cmd.name, "name")?;
        validate_budget_share(cmd.budget_share_pct)?;

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            self.ensure_category_name_free(&db_tx, user_id, &name, None)
                .await?;
            let category = Category {
                id: Uuid::new_v4(),
                user_id,
                name,
                budget_share_pct: cmd.budget_share_pct,
            };
            categories::ActiveModel::from(&category)
                .insert(&db_tx)
                .await?;
            Ok(category)
        })
    }

    pub async fn list_categories(&self, user_id: Uuid) -> ResultEngine<Vec<Category>> {
        let models = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .order_by_asc(categories::Column::NameNorm)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Category::from).collect())
    }

    pub async fn update_category(
        &self,
        category_id: Uuid,
        user_id: Uuid,
        cmd: UpdateCategoryCmd,
    ) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, category_id, user_id).await?;
            let mut category = Category::from(model);

            if let Some(name) = cmd.name.as_deref() {
                let name = normalize_required_name(name, "name")?;
                self.ensure_category_name_free(&db_tx, user_id, &name, Some(category_id))
                    .await?;
                category.name = name;
            }
            if let Some(pct) = cmd.budget_share_pct {
                validate_budget_share(pct)?;
                category.budget_share_pct = pct;
            }

            categories::ActiveModel::from(&category)
                .update(&db_tx)
                .await?;
            Ok(category)
        })
    }

    /// Deletes a category. Transactions and recurring payments that used it
    /// become uncategorized.
    pub async fn delete_category(&self, category_id: Uuid, user_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_category(&db_tx, category_id, user_id).await?;

            transactions::Entity::update_many()
                .col_expr(
                    transactions::Column::CategoryId,
                    Expr::value(Option::<Uuid>::None),
                )
                .filter(transactions::Column::CategoryId.eq(category_id))
                .exec(&db_tx)
                .await?;
            recurring_payments::Entity::update_many()
                .col_expr(
                    recurring_payments::Column::CategoryId,
                    Expr::value(Option::<Uuid>::None),
                )
                .filter(recurring_payments::Column::CategoryId.eq(category_id))
                .exec(&db_tx)
                .await?;
            categories::Entity::delete_by_id(category_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }
}
