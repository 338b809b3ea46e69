use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "parking_lots")]
pub struct Model {
    pub prime_location_name: String,
    pub address: String,
    pub pin_code: String,
    /// Price per hour.
    pub hourly_rate: f64,
    pub number_of_spots: i32,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[sea_orm(default_value = true)]
    pub is_active: bool,
    #[sea_orm(has_many)]
    pub spots: HasMany<super::parking_spot::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
