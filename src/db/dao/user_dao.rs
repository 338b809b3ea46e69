use sea_orm::{ColumnTrait, DatabaseConnection, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoResult, PaginatedResponse};
use crate::db::entities::prelude::User;
use crate::db::entities::user;

#[derive(Clone)]
pub struct UserDao {
    db: DatabaseConnection,
}

impl DaoBase for UserDao {
    type Entity = User;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl UserDao {
    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<user::Model>> {
        let email = email.to_string();
        self.find(1, 1, None, move |query| {
            query.filter(user::Column::Email.eq(email))
        })
        .await
        .map(|response| response.data.into_iter().next())
    }

    pub async fn find_by_username(&self, username: &str) -> DaoResult<Option<user::Model>> {
        let username = username.to_string();
        self.find(1, 1, None, move |query| {
            query.filter(user::Column::Username.eq(username))
        })
        .await
        .map(|response| response.data.into_iter().next())
    }

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        phone_number: Option<&str>,
        role: &str,
    ) -> DaoResult<user::Model> {
        let model = user::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            phone_number: Set(phone_number.map(str::to_string)),
            role: Set(role.to_string()),
            is_active: Set(true),
            last_login_at: Set(None),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn set_last_login(
        &self,
        id: &Uuid,
        at: &chrono::DateTime<chrono::FixedOffset>,
    ) -> DaoResult<()> {
        let at = *at;
        self.update(*id, move |active| {
            active.last_login_at = Set(Some(at));
        })
        .await
        .map(|_| ())
    }

    pub async fn list_page(
        &self,
        page: u64,
        page_size: u64,
    ) -> DaoResult<PaginatedResponse<user::Model>> {
        self.find(page, page_size, None, |query| query).await
    }

    /// Active regular users whose id is not in `recent_user_ids`; the
    /// reminder job feeds the ids of users with a recent reservation.
    pub async fn find_without_recent_activity(
        &self,
        recent_user_ids: Vec<Uuid>,
    ) -> DaoResult<Vec<user::Model>> {
        let mut pager = self.find_iter(None, None, move |query| {
            let query = query
                .filter(user::Column::Role.eq("user"))
                .filter(user::Column::IsActive.eq(true));
            if recent_user_ids.is_empty() {
                query
            } else {
                query.filter(user::Column::Id.is_not_in(recent_user_ids.clone()))
            }
        });
        let mut users = Vec::new();
        while let Some(mut response) = pager.next_page().await? {
            users.append(&mut response.data);
        }
        Ok(users)
    }

    pub async fn list_active_users(&self) -> DaoResult<Vec<user::Model>> {
        let mut pager = self.find_iter(None, None, |query| {
            query
                .filter(user::Column::Role.eq("user"))
                .filter(user::Column::IsActive.eq(true))
        });
        let mut users = Vec::new();
        while let Some(mut response) = pager.next_page().await? {
            users.append(&mut response.data);
        }
        Ok(users)
    }
}
