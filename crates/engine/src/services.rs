//! Bookable services.
//!
//! A `Service` is read-only from the booking core's point of view: prices are
//! looked up at booking time and captured into the appointment total, so a
//! later price change never alters past appointments.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub price: Money,
    pub duration_minutes: u32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Service {
    pub fn new(name: String, price: Money, duration_minutes: u32) -> ResultEngine<Self> {
        if !price.is_positive() {
            return Err(EngineError::OutOfRange(
                "service price must be > 0".to_string(),
            ));
        }
        if duration_minutes == 0 {
            return Err(EngineError::OutOfRange(
                "service duration must be > 0 minutes".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            price,
            duration_minutes,
            active: true,
            created_at: Utc::now(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub price_minor: i64,
    pub duration_minutes: i32,
    pub active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Service> for ActiveModel {
    fn from(service: &Service) -> Self {
        Self {
            id: ActiveValue::Set(service.id.to_string()),
            name: ActiveValue::Set(service.name.clone()),
            price_minor: ActiveValue::Set(service.price.cents()),
            duration_minutes: ActiveValue::Set(
                i32::try_from(service.duration_minutes).unwrap_or(i32::MAX),
            ),
            active: ActiveValue::Set(service.active),
            created_at: ActiveValue::Set(service.created_at),
        }
    }
}

impl TryFrom<Model> for Service {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "service")?,
            name: model.name,
            price: Money::new(model.price_minor),
            duration_minutes: u32::try_from(model.duration_minutes)
                .map_err(|_| EngineError::OutOfRange("negative service duration".to_string()))?,
            active: model.active,
            created_at: model.created_at,
        })
    }
}
