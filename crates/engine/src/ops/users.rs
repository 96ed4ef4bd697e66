use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, User, sessions, users};

use super::{Engine, with_tx};

fn normalize_email(email: &str) -> ResultEngine<String> {
    let email = email.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(EngineError::field("email", "must be a valid email address"));
    }
    Ok(email)
}

impl Engine {
    /// Registers a user. Emails are unique, compared case-insensitively.
    pub async fn create_user(&self, email: &str, display_name: Option<&str>) -> ResultEngine<User> {
        let email = normalize_email(email)?;
        with_tx!(self, |db_tx| {
            let existing = users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::ExistingKey(email));
            }

            let model = users::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                email: ActiveValue::Set(email),
                display_name: ActiveValue::Set(crate::util::normalize_optional_text(display_name)),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(user_id = %model.id, "user created");
            Ok(User::from(model))
        })
    }

    pub async fn user_by_email(&self, email: &str) -> ResultEngine<User> {
        let email = normalize_email(email)?;
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?
            .map(User::from)
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    /// Stores a session token handed out by the identity provider.
    pub async fn store_session(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        if token.trim().is_empty() {
            return Err(EngineError::field("token", "must not be empty"));
        }
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            sessions::ActiveModel {
                token: ActiveValue::Set(token.to_string()),
                user_id: ActiveValue::Set(user_id),
                expires_at: ActiveValue::Set(expires_at),
            }
            .insert(&db_tx)
            .await?;
            Ok(())
        })
    }

    /// Creates a random session token valid for `ttl`.
    pub async fn issue_session(&self, user_id: Uuid, ttl: Duration) -> ResultEngine<String> {
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        self.store_session(&token, user_id, Utc::now() + ttl).await?;
        Ok(token)
    }

    /// Resolves a session token to its user; `None` for unknown or expired
    /// tokens.
    pub async fn user_for_session(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Option<User>> {
        let row = sessions::Entity::find_by_id(token.to_string())
            .filter(sessions::Column::ExpiresAt.gt(now))
            .find_also_related(users::Entity)
            .one(&self.database)
            .await?;
        Ok(row.and_then(|(_, user)| user).map(User::from))
    }

    pub async fn revoke_session(&self, token: &str) -> ResultEngine<()> {
        sessions::Entity::delete_by_id(token.to_string())
            .exec(&self.database)
            .await?;
        Ok(())
    }
}
