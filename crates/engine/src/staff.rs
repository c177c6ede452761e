//! Staff members who perform services.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

/// Upper bound for a commission, in basis points (100%).
pub const MAX_COMMISSION_BPS: u32 = 10_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Staff {
    pub id: Uuid,
    pub name: String,
    /// Commission on completed appointments, in basis points (`1_000` = 10%).
    pub commission_bps: u32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Staff {
    pub fn new(name: String, commission_bps: u32) -> ResultEngine<Self> {
        if commission_bps > MAX_COMMISSION_BPS {
            return Err(EngineError::OutOfRange(format!(
                "commission must be between 0 and {MAX_COMMISSION_BPS} basis points"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            commission_bps,
            active: true,
            created_at: Utc::now(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "staff")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub commission_bps: i32,
    pub active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::appointments::Entity")]
    Appointments,
}

impl Related<super::appointments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Appointments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Staff> for ActiveModel {
    fn from(staff: &Staff) -> Self {
        Self {
            id: ActiveValue::Set(staff.id.to_string()),
            name: ActiveValue::Set(staff.name.clone()),
            commission_bps: ActiveValue::Set(
                i32::try_from(staff.commission_bps).unwrap_or(i32::MAX),
            ),
            active: ActiveValue::Set(staff.active),
            created_at: ActiveValue::Set(staff.created_at),
        }
    }
}

impl TryFrom<Model> for Staff {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "staff")?,
            name: model.name,
            commission_bps: u32::try_from(model.commission_bps)
                .map_err(|_| EngineError::OutOfRange("negative commission".to_string()))?,
            active: model.active,
            created_at: model.created_at,
        })
    }
}
