//! Appointment primitives.
//!
//! An `Appointment` books one staff member for one client at a single instant.
//! Its end is never stored: `duration_minutes` is the sum of the booked
//! services' durations, captured together with `total_value` at booking time.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AppointmentStatus, EngineError, Money, ResultEngine,
    util::{parse_uuid, parse_uuid_list},
};

/// How the client paid. Informational only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    Pix,
    Other,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::CreditCard => "credit_card",
            Self::DebitCard => "debit_card",
            Self::Pix => "pix",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "credit_card" => Ok(Self::CreditCard),
            "debit_card" => Ok(Self::DebitCard),
            "pix" => Ok(Self::Pix),
            "other" => Ok(Self::Other),
            other => Err(EngineError::InvalidId(format!(
                "invalid payment method: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub staff_id: Uuid,
    /// Ordered; repeats allowed, each occurrence priced on its own.
    pub service_ids: Vec<Uuid>,
    pub start_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub total_value: Money,
    pub duration_minutes: u32,
    pub notes: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Derived end of the appointment (`start_time + duration`).
    #[must_use]
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + Duration::minutes(i64::from(self.duration_minutes))
    }

    /// Moves the appointment to `target`, failing on an illegal transition.
    pub fn transition(&mut self, target: AppointmentStatus, at: DateTime<Utc>) -> ResultEngine<()> {
        self.status = self.status.transition(target)?;
        self.updated_at = at;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "appointments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub client_id: String,
    pub staff_id: String,
    /// JSON array of service ids.
    pub service_ids: String,
    pub start_time: DateTimeUtc,
    pub status: String,
    pub total_minor: i64,
    pub duration_minutes: i32,
    pub notes: Option<String>,
    pub payment_method: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::staff::Entity",
        from = "Column::StaffId",
        to = "super::staff::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Staff,
}

impl Related<super::staff::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Staff.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&Appointment> for ActiveModel {
    type Error = EngineError;

    fn try_from(appointment: &Appointment) -> Result<Self, Self::Error> {
        let ids: Vec<String> = appointment
            .service_ids
            .iter()
            .map(ToString::to_string)
            .collect();
        let service_ids = serde_json::to_string(&ids)
            .map_err(|_| EngineError::InvalidId("unserializable service ids".to_string()))?;
        Ok(Self {
            id: ActiveValue::Set(appointment.id.to_string()),
            client_id: ActiveValue::Set(appointment.client_id.to_string()),
            staff_id: ActiveValue::Set(appointment.staff_id.to_string()),
            service_ids: ActiveValue::Set(service_ids),
            start_time: ActiveValue::Set(appointment.start_time),
            status: ActiveValue::Set(appointment.status.as_str().to_string()),
            total_minor: ActiveValue::Set(appointment.total_value.cents()),
            duration_minutes: ActiveValue::Set(
                i32::try_from(appointment.duration_minutes).unwrap_or(i32::MAX),
            ),
            notes: ActiveValue::Set(appointment.notes.clone()),
            payment_method: ActiveValue::Set(
                appointment.payment_method.map(|m| m.as_str().to_string()),
            ),
            created_at: ActiveValue::Set(appointment.created_at),
            updated_at: ActiveValue::Set(appointment.updated_at),
        })
    }
}

impl TryFrom<Model> for Appointment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let raw_ids: Vec<String> = serde_json::from_str(&model.service_ids)
            .map_err(|_| EngineError::InvalidId("invalid service id list".to_string()))?;
        Ok(Self {
            id: parse_uuid(&model.id, "appointment")?,
            client_id: parse_uuid(&model.client_id, "client")?,
            staff_id: parse_uuid(&model.staff_id, "staff")?,
            service_ids: parse_uuid_list(&raw_ids, "service")?,
            start_time: model.start_time,
            status: AppointmentStatus::try_from(model.status.as_str())?,
            total_value: Money::new(model.total_minor),
            duration_minutes: u32::try_from(model.duration_minutes)
                .map_err(|_| EngineError::OutOfRange("negative duration".to_string()))?,
            notes: model.notes,
            payment_method: model
                .payment_method
                .as_deref()
                .map(PaymentMethod::try_from)
                .transpose()?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sample() -> Appointment {
        let start = Utc.with_ymd_and_hms(2030, 5, 6, 14, 0, 0).unwrap();
        Appointment {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            staff_id: Uuid::new_v4(),
            service_ids: vec![Uuid::new_v4(), Uuid::new_v4()],
            start_time: start,
            status: AppointmentStatus::Scheduled,
            total_value: Money::new(5_000),
            duration_minutes: 75,
            notes: Some("fringe only".to_string()),
            payment_method: Some(PaymentMethod::Pix),
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn end_time_is_derived_from_duration() {
        let appointment = sample();
        assert_eq!(
            appointment.end_time(),
            Utc.with_ymd_and_hms(2030, 5, 6, 15, 15, 0).unwrap()
        );
    }

    #[test]
    fn service_ids_are_stored_as_json_array() {
        let appointment = sample();
        let active = ActiveModel::try_from(&appointment).unwrap();
        let ActiveValue::Set(raw) = active.service_ids else {
            panic!("service_ids not set");
        };
        let ids: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], appointment.service_ids[0].to_string());
    }

    #[test]
    fn unknown_status_column_is_rejected() {
        let appointment = sample();
        let model = Model {
            id: appointment.id.to_string(),
            client_id: appointment.client_id.to_string(),
            staff_id: appointment.staff_id.to_string(),
            service_ids: "[]".to_string(),
            start_time: appointment.start_time,
            status: "nao_compareceu".to_string(),
            total_minor: 0,
            duration_minutes: 0,
            notes: None,
            payment_method: None,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        };
        assert!(matches!(
            Appointment::try_from(model),
            Err(EngineError::InvalidId(_))
        ));
    }
}
