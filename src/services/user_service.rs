use uuid::Uuid;

use crate::{
    auth::password,
    db::dao::{DaoBase, DaoLayerError, PaginatedResponse, UserDao},
    db::entities::user,
    error::AppError,
    parking::validate,
};

#[derive(Clone)]
pub struct UserService {
    user_dao: UserDao,
}

#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub phone_number: Option<String>,
    pub new_password: Option<String>,
}

impl UserService {
    pub fn new(user_dao: UserDao) -> Self {
        Self { user_dao }
    }

    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<user::Model>, AppError> {
        match self.user_dao.find_by_id(*id).await {
            Ok(model) => Ok(Some(model)),
            Err(DaoLayerError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn require(&self, id: &Uuid) -> Result<user::Model, AppError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, AppError> {
        Ok(self.user_dao.find_by_email(email).await?)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<user::Model>, AppError> {
        Ok(self.user_dao.find_by_username(username).await?)
    }

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        phone_number: Option<&str>,
        role: &str,
    ) -> Result<user::Model, AppError> {
        Ok(self
            .user_dao
            .create_user(username, email, password_hash, phone_number, role)
            .await?)
    }

    pub async fn set_last_login(
        &self,
        user_id: &Uuid,
        last_login: &chrono::DateTime<chrono::FixedOffset>,
    ) -> Result<(), AppError> {
        Ok(self.user_dao.set_last_login(user_id, last_login).await?)
    }

    pub async fn update_profile(
        &self,
        user_id: &Uuid,
        update: ProfileUpdate,
    ) -> Result<user::Model, AppError> {
        if let Some(phone) = update.phone_number.as_deref() {
            validate::validate_phone_number(phone)?;
        }
        let password_hash = match update.new_password.as_deref() {
            Some(new_password) => Some(password::hash_password(new_password)?),
            None => None,
        };

        let user = self
            .user_dao
            .update(*user_id, move |active| {
                if let Some(phone) = update.phone_number {
                    active.phone_number = sea_orm::Set(Some(phone));
                }
                if let Some(hash) = password_hash {
                    active.password_hash = sea_orm::Set(hash);
                }
            })
            .await?;
        Ok(user)
    }

    /// Admin mutation: role change and soft enable/disable.
    pub async fn update_account(
        &self,
        user_id: &Uuid,
        role: Option<String>,
        is_active: Option<bool>,
    ) -> Result<user::Model, AppError> {
        if let Some(role) = role.as_deref() {
            crate::auth::Role::try_from(role)
                .map_err(|()| AppError::bad_request("Invalid role"))?;
        }

        let user = self
            .user_dao
            .update(*user_id, move |active| {
                if let Some(role) = role {
                    active.role = sea_orm::Set(role);
                }
                if let Some(is_active) = is_active {
                    active.is_active = sea_orm::Set(is_active);
                }
            })
            .await?;
        Ok(user)
    }

    pub async fn list_page(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<user::Model>, AppError> {
        Ok(self.user_dao.list_page(page, page_size).await?)
    }
}
