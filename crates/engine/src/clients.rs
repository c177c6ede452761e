//! Clients who book appointments.
//!
//! Contact fields (phone, email, CPF) arrive pre-validated; the engine only
//! trims them.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub cpf: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Client {
    pub fn new(
        name: String,
        phone: Option<String>,
        email: Option<String>,
        cpf: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            phone,
            email,
            cpf,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub cpf: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Client> for ActiveModel {
    fn from(client: &Client) -> Self {
        Self {
            id: ActiveValue::Set(client.id.to_string()),
            name: ActiveValue::Set(client.name.clone()),
            phone: ActiveValue::Set(client.phone.clone()),
            email: ActiveValue::Set(client.email.clone()),
            cpf: ActiveValue::Set(client.cpf.clone()),
            created_at: ActiveValue::Set(client.created_at),
        }
    }
}

impl TryFrom<Model> for Client {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "client")?,
            name: model.name,
            phone: model.phone,
            email: model.email,
            cpf: model.cpf,
            created_at: model.created_at,
        })
    }
}
