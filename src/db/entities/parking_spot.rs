use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "parking_spots")]
pub struct Model {
    #[sea_orm(indexed)]
    pub lot_id: Uuid,
    pub spot_number: String,
    /// One of `available`, `reserved`, `occupied`; only the lifecycle
    /// manager moves this field, together with the owning reservation row.
    pub status: String,
    #[sea_orm(default_value = true)]
    pub is_active: bool,
    #[sea_orm(belongs_to, from = "lot_id", to = "id", on_delete = "Cascade")]
    pub lot: HasOne<super::parking_lot::Entity>,
    #[sea_orm(has_many)]
    pub reservations: HasMany<super::reservation::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
