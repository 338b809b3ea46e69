use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

/// A reservation is an audit record: it is never deleted, only moved
/// through its status field.
#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    #[sea_orm(indexed)]
    pub user_id: Uuid,
    #[sea_orm(indexed)]
    pub spot_id: Uuid,
    pub vehicle_number: String,
    /// One of `reserved`, `active`, `completed`, `cancelled`.
    pub status: String,
    pub parking_timestamp: Option<DateTimeWithTimeZone>,
    pub leaving_timestamp: Option<DateTimeWithTimeZone>,
    /// Elapsed hours, rounded to 2 decimals for display.
    pub total_hours: Option<f64>,
    /// Estimate (1x hourly rate) while live; final billed amount once
    /// completed or cancelled from active.
    pub parking_cost: Option<f64>,
    pub remarks: Option<String>,
    #[sea_orm(belongs_to, from = "user_id", to = "id", on_delete = "Cascade")]
    pub user: HasOne<super::user::Entity>,
    #[sea_orm(belongs_to, from = "spot_id", to = "id", on_delete = "Cascade")]
    pub spot: HasOne<super::parking_spot::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
