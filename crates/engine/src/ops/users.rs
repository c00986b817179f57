use sea_orm::{QueryFilter, SqlErr, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, User, users};

use super::{Engine, normalize_required_text};

fn normalize_email(value: &str) -> ResultEngine<String> {
    let email = value.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !valid {
        return Err(EngineError::InvalidInput("invalid email address".to_string()));
    }
    Ok(email)
}

impl Engine {
    /// Creates a user with a bcrypt-hashed password.
    ///
    /// The email is trimmed and lower-cased; a second account with the same
    /// email fails with [`EngineError::ExistingKey`].
    pub async fn register_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> ResultEngine<User> {
        let name = normalize_required_text(name, "name")?;
        let email = normalize_email(email)?;
        if password.is_empty() {
            return Err(EngineError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }

        let password_hash = bcrypt::hash(password, self.password_cost)?;
        let user = User {
            id: Uuid::new_v4(),
            name,
            email,
            created_at: self.clock.now(),
        };

        match users::ActiveModel::new_user(&user, password_hash)
            .insert(&self.database)
            .await
        {
            Ok(_) => {}
            Err(err) => {
                if let Some(SqlErr::UniqueConstraintViolation(_)) = err.sql_err() {
                    return Err(EngineError::ExistingKey(user.email));
                }
                return Err(err.into());
            }
        }

        tracing::info!(user_id = %user.id, "registered user");
        Ok(user)
    }

    /// Checks an email/password pair.
    ///
    /// Unknown emails and wrong passwords produce the same
    /// [`EngineError::InvalidCredentials`].
    pub async fn verify_credentials(&self, email: &str, password: &str) -> ResultEngine<User> {
        let email = email.trim().to_lowercase();
        let Some(model) = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?
        else {
            return Err(EngineError::InvalidCredentials);
        };

        if !bcrypt::verify(password, &model.password_hash)? {
            return Err(EngineError::InvalidCredentials);
        }

        User::try_from(model)
    }

    pub async fn user_by_id(&self, user_id: Uuid) -> ResultEngine<Option<User>> {
        users::Entity::find_by_id(user_id.to_string())
            .one(&self.database)
            .await?
            .map(User::try_from)
            .transpose()
    }
}
