use std::{error::Error, io::Write};

use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{BookingPolicy, DateRange, Engine, Money};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection, EntityTrait, Set};
use serde::Serialize;
use uuid::Uuid;

mod users {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub username: String,
        pub password: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Parser, Debug)]
#[command(name = "agenda_admin")]
#[command(about = "Admin utilities for Agenda (bootstrap users and catalog, reports)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./agenda.db?mode=rwc"
    )]
    database_url: String,

    /// Business timezone used for "today" and local dates in reports.
    #[arg(long, env = "AGENDA__BOOKING__TIMEZONE", default_value = "America/Sao_Paulo")]
    timezone: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Client(Client),
    Staff(Staff),
    Service(Service),
    Appointment(Appointment),
    Report(Report),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
}

#[derive(Args, Debug)]
struct Client {
    #[command(subcommand)]
    command: ClientCommand,
}

#[derive(Subcommand, Debug)]
enum ClientCommand {
    Create(ClientCreateArgs),
}

#[derive(Args, Debug)]
struct ClientCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    cpf: Option<String>,
}

#[derive(Args, Debug)]
struct Staff {
    #[command(subcommand)]
    command: StaffCommand,
}

#[derive(Subcommand, Debug)]
enum StaffCommand {
    Create(StaffCreateArgs),
    /// Stop a staff member from taking new bookings.
    Deactivate(IdArgs),
}

#[derive(Args, Debug)]
struct StaffCreateArgs {
    #[arg(long)]
    name: String,
    /// Commission in basis points (`4000` = 40%).
    #[arg(long, default_value_t = 0)]
    commission_bps: u32,
}

#[derive(Args, Debug)]
struct Service {
    #[command(subcommand)]
    command: ServiceCommand,
}

#[derive(Subcommand, Debug)]
enum ServiceCommand {
    Create(ServiceCreateArgs),
}

#[derive(Args, Debug)]
struct ServiceCreateArgs {
    #[arg(long)]
    name: String,
    /// Price, e.g. `50` or `49,90`.
    #[arg(long, value_parser = parse_money)]
    price: Money,
    #[arg(long)]
    duration_minutes: u32,
}

#[derive(Args, Debug)]
struct Appointment {
    #[command(subcommand)]
    command: AppointmentCommand,
}

#[derive(Subcommand, Debug)]
enum AppointmentCommand {
    /// Hard delete, outside the lifecycle. Linked ledger entries are kept.
    Delete(IdArgs),
}

#[derive(Args, Debug)]
struct IdArgs {
    #[arg(long)]
    id: Uuid,
}

#[derive(Args, Debug)]
struct Report {
    #[command(subcommand)]
    command: ReportCommand,
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    Summary(ReportArgs),
    Commissions(ReportArgs),
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// First day (inclusive); month to date when omitted.
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last day (inclusive).
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Write CSV rows to stdout instead of a table.
    #[arg(long)]
    csv: bool,
}

fn parse_money(raw: &str) -> Result<Money, String> {
    raw.parse::<Money>().map_err(|err| err.to_string())
}

fn parse_timezone(raw: &str) -> Result<Tz, String> {
    raw.parse::<Tz>()
        .map_err(|_| format!("unknown timezone: {raw}"))
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    kind: &'a str,
    category: &'a str,
    entries: usize,
    total: String,
}

#[derive(Serialize)]
struct CommissionRow<'a> {
    staff: &'a str,
    completed: usize,
    revenue: String,
    commission_bps: u32,
    commission: String,
}

fn write_csv<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

async fn summary_report(engine: &Engine, range: DateRange, csv: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
    let summary = engine.financial_summary(Some(range)).await?;
    let rows = summary
        .revenue_by_category
        .iter()
        .map(|row| ("revenue", row))
        .chain(summary.expense_by_category.iter().map(|row| ("expense", row)))
        .map(|(kind, row)| SummaryRow {
            kind,
            category: &row.category,
            entries: row.entries,
            total: row.total.to_string(),
        });

    if csv {
        return write_csv(rows);
    }

    println!("{} .. {}", summary.range.start, summary.range.end);
    for row in rows {
        println!(
            "  {:<8} {:<12} {:>4} {:>12}",
            row.kind, row.category, row.entries, row.total
        );
    }
    println!("revenue {:>12}", summary.total_revenue);
    println!("expense {:>12}", summary.total_expense);
    println!("balance {:>12}", summary.balance);
    Ok(())
}

async fn commission_report(engine: &Engine, range: DateRange, csv: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
    let lines = engine.commission_report(Some(range)).await?;
    let rows = lines.iter().map(|line| CommissionRow {
        staff: &line.staff_name,
        completed: line.completed,
        revenue: line.revenue.to_string(),
        commission_bps: line.commission_bps,
        commission: line.commission.to_string(),
    });

    if csv {
        return write_csv(rows);
    }

    println!("{} .. {}", range.start, range.end);
    for row in rows {
        println!(
            "  {:<20} {:>4} {:>12} {:>12}",
            row.staff, row.completed, row.revenue, row.commission
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let timezone = match parse_timezone(&cli.timezone) {
        Ok(tz) => tz,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };
    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder()
        .database(db.clone())
        .policy(BookingPolicy::default().timezone(timezone))
        .build()
        .await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = prompt_password_twice()?;

            if users::Entity::find_by_id(args.username.clone())
                .one(&db)
                .await?
                .is_some()
            {
                eprintln!("user already exists: {}", args.username);
                std::process::exit(1);
            }

            let user = users::ActiveModel {
                username: Set(args.username.clone()),
                password: Set(password),
            };
            users::Entity::insert(user).exec(&db).await?;

            println!("created user: {}", args.username);
        }
        Command::Client(Client {
            command: ClientCommand::Create(args),
        }) => {
            let client = engine
                .new_client(
                    &args.name,
                    args.phone.as_deref(),
                    args.email.as_deref(),
                    args.cpf.as_deref(),
                )
                .await?;
            println!("created client: {} ({})", client.name, client.id);
        }
        Command::Staff(Staff { command }) => match command {
            StaffCommand::Create(args) => {
                let member = engine.new_staff(&args.name, args.commission_bps).await?;
                println!("created staff member: {} ({})", member.name, member.id);
            }
            StaffCommand::Deactivate(args) => {
                let member = engine.set_staff_active(args.id, false).await?;
                println!("deactivated staff member: {}", member.name);
            }
        },
        Command::Service(Service {
            command: ServiceCommand::Create(args),
        }) => {
            let service = engine
                .new_service(&args.name, args.price, args.duration_minutes)
                .await?;
            println!(
                "created service: {} {} {}min ({})",
                service.name, service.price, service.duration_minutes, service.id
            );
        }
        Command::Appointment(Appointment {
            command: AppointmentCommand::Delete(args),
        }) => {
            engine.delete_appointment(args.id).await?;
            println!("deleted appointment: {}", args.id);
        }
        Command::Report(Report { command }) => {
            let (args, summary) = match command {
                ReportCommand::Summary(args) => (args, true),
                ReportCommand::Commissions(args) => (args, false),
            };
            let range = DateRange::resolve(args.from, args.to, engine.today());
            if summary {
                summary_report(&engine, range, args.csv).await?;
            } else {
                commission_report(&engine, range, args.csv).await?;
            }
        }
    }

    Ok(())
}
