use chrono::NaiveDate;
use sea_orm::{QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    BudgetReport, Category, RecurringPayment, ResultEngine, budget, categories,
    recurring_payments,
};

use super::{Engine, with_tx};

/// Longest projection window accepted.
const MAX_HORIZON_DAYS: u32 = 366;

impl Engine {
    /// Budget impact of the user's recurring payments, plus the charges
    /// expected in the next `horizon_days` days from `today`.
    pub async fn budget_impact(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        horizon_days: u32,
    ) -> ResultEngine<BudgetReport> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let payments: Vec<RecurringPayment> = recurring_payments::Entity::find()
                .filter(recurring_payments::Column::UserId.eq(user_id))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(RecurringPayment::try_from)
                .collect::<ResultEngine<_>>()?;
            let categories: Vec<Category> = categories::Entity::find()
                .filter(categories::Column::UserId.eq(user_id))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Category::from)
                .collect();

            let impact = budget::analyze(&payments, &categories, &self.config.budget);
            let projection =
                budget::project(&payments, today, horizon_days.min(MAX_HORIZON_DAYS));
            tracing::debug!(
                user_id = %user_id,
                total_monthly_minor = impact.total_monthly_minor,
                suggestions = impact.suggestions.len(),
                "budget impact computed"
            );
            Ok(BudgetReport { impact, projection })
        })
    }
}
