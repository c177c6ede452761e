//! Clients, staff and services: plain record keeping around the booking core.

use std::collections::HashMap;

use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    Client, EngineError, Money, ResultEngine, Service, Staff, clients, services, staff,
    util::{normalize_optional_text, normalize_required_name},
};

use super::Engine;

impl Engine {
    pub async fn new_client(
        &self,
        name: &str,
        phone: Option<&str>,
        email: Option<&str>,
        cpf: Option<&str>,
    ) -> ResultEngine<Client> {
        let client = Client::new(
            normalize_required_name(name, "client name")?,
            normalize_optional_text(phone),
            normalize_optional_text(email),
            normalize_optional_text(cpf),
        );
        clients::ActiveModel::from(&client)
            .insert(&self.database)
            .await?;
        tracing::info!(client_id = %client.id, "client created");
        Ok(client)
    }

    pub async fn client(&self, client_id: Uuid) -> ResultEngine<Client> {
        require_client(&self.database, client_id).await
    }

    pub async fn clients(&self) -> ResultEngine<Vec<Client>> {
        clients::Entity::find()
            .order_by_asc(clients::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Client::try_from)
            .collect()
    }

    pub async fn new_staff(&self, name: &str, commission_bps: u32) -> ResultEngine<Staff> {
        let member = Staff::new(normalize_required_name(name, "staff name")?, commission_bps)?;
        staff::ActiveModel::from(&member)
            .insert(&self.database)
            .await?;
        tracing::info!(staff_id = %member.id, "staff member created");
        Ok(member)
    }

    pub async fn staff_member(&self, staff_id: Uuid) -> ResultEngine<Staff> {
        find_staff(&self.database, staff_id).await
    }

    pub async fn staff(&self, include_inactive: bool) -> ResultEngine<Vec<Staff>> {
        let mut query = staff::Entity::find().order_by_asc(staff::Column::Name);
        if !include_inactive {
            query = query.filter(staff::Column::Active.eq(true));
        }
        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Staff::try_from)
            .collect()
    }

    /// Inactive staff keep their history but cannot take new bookings.
    pub async fn set_staff_active(&self, staff_id: Uuid, active: bool) -> ResultEngine<Staff> {
        let mut member = find_staff(&self.database, staff_id).await?;
        staff::ActiveModel {
            id: ActiveValue::Set(staff_id.to_string()),
            active: ActiveValue::Set(active),
            ..Default::default()
        }
        .update(&self.database)
        .await?;
        member.active = active;
        Ok(member)
    }

    pub async fn new_service(
        &self,
        name: &str,
        price: Money,
        duration_minutes: u32,
    ) -> ResultEngine<Service> {
        let service = Service::new(
            normalize_required_name(name, "service name")?,
            price,
            duration_minutes,
        )?;
        services::ActiveModel::from(&service)
            .insert(&self.database)
            .await?;
        tracing::info!(service_id = %service.id, price = %service.price, "service created");
        Ok(service)
    }

    pub async fn service(&self, service_id: Uuid) -> ResultEngine<Service> {
        services::Entity::find_by_id(service_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::ReferenceNotFound(format!("service {service_id}")))
            .and_then(Service::try_from)
    }

    pub async fn services(&self, include_inactive: bool) -> ResultEngine<Vec<Service>> {
        let mut query = services::Entity::find().order_by_asc(services::Column::Name);
        if !include_inactive {
            query = query.filter(services::Column::Active.eq(true));
        }
        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Service::try_from)
            .collect()
    }

    /// Changes the list price. Totals already captured by appointments stay as they are.
    pub async fn update_service_price(&self, service_id: Uuid, price: Money) -> ResultEngine<Service> {
        if !price.is_positive() {
            return Err(EngineError::OutOfRange(
                "service price must be > 0".to_string(),
            ));
        }
        let mut service = self.service(service_id).await?;
        services::ActiveModel {
            id: ActiveValue::Set(service_id.to_string()),
            price_minor: ActiveValue::Set(price.cents()),
            ..Default::default()
        }
        .update(&self.database)
        .await?;
        tracing::info!(%service_id, old = %service.price, new = %price, "service price updated");
        service.price = price;
        Ok(service)
    }

    pub async fn set_service_active(&self, service_id: Uuid, active: bool) -> ResultEngine<Service> {
        let mut service = self.service(service_id).await?;
        services::ActiveModel {
            id: ActiveValue::Set(service_id.to_string()),
            active: ActiveValue::Set(active),
            ..Default::default()
        }
        .update(&self.database)
        .await?;
        service.active = active;
        Ok(service)
    }
}

pub(super) async fn require_client<C: ConnectionTrait>(db: &C, client_id: Uuid) -> ResultEngine<Client> {
    clients::Entity::find_by_id(client_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::ReferenceNotFound(format!("client {client_id}")))
        .and_then(Client::try_from)
}

async fn find_staff<C: ConnectionTrait>(db: &C, staff_id: Uuid) -> ResultEngine<Staff> {
    staff::Entity::find_by_id(staff_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::ReferenceNotFound(format!("staff {staff_id}")))
        .and_then(Staff::try_from)
}

/// Staff member who can take bookings.
pub(super) async fn require_active_staff<C: ConnectionTrait>(
    db: &C,
    staff_id: Uuid,
) -> ResultEngine<Staff> {
    let member = find_staff(db, staff_id).await?;
    if !member.active {
        return Err(EngineError::ReferenceNotFound(format!(
            "staff {staff_id} is inactive"
        )));
    }
    Ok(member)
}

/// Active services among `ids`, keyed by id. Unknown or inactive ids are
/// simply absent, so pricing reports them.
pub(super) async fn active_service_catalog<C: ConnectionTrait>(
    db: &C,
    ids: &[Uuid],
) -> ResultEngine<HashMap<Uuid, Service>> {
    let keys: Vec<String> = ids.iter().map(ToString::to_string).collect();
    services::Entity::find()
        .filter(services::Column::Id.is_in(keys))
        .filter(services::Column::Active.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|model| Service::try_from(model).map(|s| (s.id, s)))
        .collect()
}

pub(super) async fn staff_by_id<C: ConnectionTrait>(db: &C) -> ResultEngine<HashMap<Uuid, Staff>> {
    staff::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|model| Staff::try_from(model).map(|s| (s.id, s)))
        .collect()
}
