use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use chrono::{NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::{BookingPolicy, ResultEngine};

mod appointments;
mod catalog;
mod ledger;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// One async lock per staff member.
///
/// Booking reads the staff member's agenda, checks it and writes; holding the
/// lock across the three steps keeps two concurrent requests from both
/// passing the conflict check.
#[derive(Debug, Default)]
struct StaffLocks {
    locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl StaffLocks {
    fn handle(&self, staff_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(staff_id).or_default())
    }

    /// Lock every id in a stable order so two edits swapping staff cannot deadlock.
    async fn acquire(&self, mut staff_ids: Vec<Uuid>) -> Vec<tokio::sync::OwnedMutexGuard<()>> {
        staff_ids.sort_unstable();
        staff_ids.dedup();
        let mut guards = Vec::with_capacity(staff_ids.len());
        for staff_id in staff_ids {
            guards.push(self.handle(staff_id).lock_owned().await);
        }
        guards
    }
}

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    policy: BookingPolicy,
    staff_locks: StaffLocks,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    /// Today's date in the business timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.policy.timezone).date_naive()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    policy: BookingPolicy,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the default booking rules.
    pub fn policy(mut self, policy: BookingPolicy) -> EngineBuilder {
        self.policy = policy;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        tracing::debug!(timezone = %self.policy.timezone, "engine ready");
        Ok(Engine {
            database: self.database,
            policy: self.policy,
            staff_locks: StaffLocks::default(),
        })
    }
}
