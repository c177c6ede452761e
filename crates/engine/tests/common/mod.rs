use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{BookingPolicy, Client, Engine, Money, Service, Staff};
use migration::MigratorTrait;

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .policy(BookingPolicy::default().timezone(chrono_tz::UTC))
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// A fixed instant far enough ahead to always be in the future.
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2099, 3, 10, hour, minute, 0).unwrap()
}

pub struct Fixture {
    pub client: Client,
    pub ana: Staff,
    pub bruno: Staff,
    pub haircut: Service,
    pub beard: Service,
}

pub async fn fixture(engine: &Engine) -> Fixture {
    let client = engine
        .new_client("Maria Souza", Some("11 99999-0000"), None, None)
        .await
        .unwrap();
    let ana = engine.new_staff("Ana", 4_000).await.unwrap();
    let bruno = engine.new_staff("Bruno", 1_250).await.unwrap();
    let haircut = engine
        .new_service("Haircut", Money::new(50_00), 45)
        .await
        .unwrap();
    let beard = engine
        .new_service("Beard trim", Money::new(30_00), 20)
        .await
        .unwrap();
    Fixture {
        client,
        ana,
        bruno,
        haircut,
        beard,
    }
}
