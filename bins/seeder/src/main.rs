//! Database seeder for Carebase development and testing.
//!
//! Seeds a demo tenant with an administrator, a support worker, two
//! clients, a rate card, public holidays, and a weekly shift series.
//! Running it again leaves existing rows alone.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use rust_decimal_macros::dec;

use carebase_core::{
    auth::hash_password,
    billing::{RateBand, RateCardEntry},
    roster::{RecurrenceEnd, RecurrenceRule, RepeatUnit},
};
use carebase_db::{
    ClientRepository, InvoiceRepository, ShiftRepository, TenantRepository, UserRepository,
    entities::{sea_orm_active_enums::UserRole, tenants, users},
    repositories::{CreateClientInput, CreateShiftInput, CreateUserInput},
};
use carebase_shared::{DatabaseConfig, types::Money};
use sea_orm::DatabaseConnection;

const DEMO_SLUG: &str = "demo";
const DEMO_PASSWORD: &str = "Carebase-demo-2025";

const RATES: [(RateBand, &str, &str, rust_decimal::Decimal); 6] = [
    (
        RateBand::WeekdayDaytime,
        "01_011_0107_1_1",
        "Assistance With Self-Care Activities - Standard - Weekday Daytime",
        dec!(67.56),
    ),
    (
        RateBand::WeekdayEvening,
        "01_015_0107_1_1",
        "Assistance With Self-Care Activities - Standard - Weekday Evening",
        dec!(74.44),
    ),
    (
        RateBand::WeekdayNight,
        "01_002_0107_1_1",
        "Assistance With Self-Care Activities - Standard - Weekday Night",
        dec!(75.82),
    ),
    (
        RateBand::Saturday,
        "01_013_0107_1_1",
        "Assistance With Self-Care Activities - Standard - Saturday",
        dec!(95.03),
    ),
    (
        RateBand::Sunday,
        "01_014_0107_1_1",
        "Assistance With Self-Care Activities - Standard - Sunday",
        dec!(122.49),
    ),
    (
        RateBand::PublicHoliday,
        "01_012_0107_1_1",
        "Assistance With Self-Care Activities - Standard - Public Holiday",
        dec!(150.10),
    ),
];

const HOLIDAYS: [((i32, u32, u32), &str); 7] = [
    ((2025, 1, 1), "New Year's Day"),
    ((2025, 1, 27), "Australia Day"),
    ((2025, 4, 18), "Good Friday"),
    ((2025, 4, 21), "Easter Monday"),
    ((2025, 4, 25), "Anzac Day"),
    ((2025, 12, 25), "Christmas Day"),
    ((2025, 12, 26), "Boxing Day"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = carebase_db::connect(&DatabaseConfig {
        url,
        max_connections: 2,
        min_connections: 1,
        connect_timeout_secs: 10,
    })
    .await
    .context("Failed to connect to database")?;

    println!("Seeding demo tenant...");
    let (tenant, fresh) = seed_tenant(&db).await?;

    println!("Seeding staff...");
    let admin = seed_user(&db, &tenant, "admin@demo.carebase.dev", "Avery Admin", UserRole::Admin)
        .await?;
    let worker = seed_user(
        &db,
        &tenant,
        "worker@demo.carebase.dev",
        "Sam Support",
        UserRole::SupportWorker,
    )
    .await?;

    println!("Seeding rate card...");
    seed_rate_card(&db, &tenant).await?;

    println!("Seeding public holidays...");
    seed_holidays(&db, &tenant).await?;

    if fresh {
        println!("Seeding clients and roster...");
        seed_roster(&db, &tenant, &admin, &worker).await?;
    } else {
        println!("  Tenant already existed, skipping clients and roster...");
    }

    println!("Seeding complete!");
    println!("  Sign in to tenant '{DEMO_SLUG}' with password '{DEMO_PASSWORD}'");
    Ok(())
}

/// Returns the demo tenant and whether it was just created.
async fn seed_tenant(db: &DatabaseConnection) -> anyhow::Result<(tenants::Model, bool)> {
    let tenants = TenantRepository::new(db.clone());
    if let Some(tenant) = tenants.find_by_slug(DEMO_SLUG).await? {
        println!("  Demo tenant already exists, skipping...");
        return Ok((tenant, false));
    }

    let tenant = tenants.create("Demo Care Services", DEMO_SLUG).await?;
    println!("  Created tenant {}", tenant.id);
    Ok((tenant, true))
}

async fn seed_user(
    db: &DatabaseConnection,
    tenant: &tenants::Model,
    email: &str,
    full_name: &str,
    role: UserRole,
) -> anyhow::Result<users::Model> {
    let users = UserRepository::new(db.clone());
    if let Some(user) = users.find_by_email(tenant.id, email).await? {
        println!("  {email} already exists, skipping...");
        return Ok(user);
    }

    let user = users
        .create(CreateUserInput {
            tenant_id: tenant.id,
            email: email.to_string(),
            password_hash: hash_password(DEMO_PASSWORD)?,
            full_name: full_name.to_string(),
            role,
        })
        .await?;
    println!("  Created {email}");
    Ok(user)
}

async fn seed_rate_card(db: &DatabaseConnection, tenant: &tenants::Model) -> anyhow::Result<()> {
    let invoices = InvoiceRepository::new(db.clone());
    for (band, item, description, rate) in RATES {
        invoices
            .set_rate(
                tenant.id,
                band,
                RateCardEntry {
                    support_item_number: item.to_string(),
                    description: description.to_string(),
                    hourly_rate: Money::new(rate),
                },
            )
            .await?;
    }
    Ok(())
}

async fn seed_holidays(db: &DatabaseConnection, tenant: &tenants::Model) -> anyhow::Result<()> {
    let invoices = InvoiceRepository::new(db.clone());
    for ((year, month, day), name) in HOLIDAYS {
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .with_context(|| format!("invalid holiday date {year}-{month}-{day}"))?;
        if invoices.add_holiday(tenant.id, date, name).await?.is_none() {
            println!("  {date} already a holiday, skipping...");
        }
    }
    Ok(())
}

async fn seed_roster(
    db: &DatabaseConnection,
    tenant: &tenants::Model,
    admin: &users::Model,
    worker: &users::Model,
) -> anyhow::Result<()> {
    let clients = ClientRepository::new(db.clone());
    let jordan = clients
        .create(CreateClientInput {
            tenant_id: tenant.id,
            first_name: "Jordan".to_string(),
            last_name: "Lee".to_string(),
            ndis_number: Some("430000001".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1988, 3, 14),
            phone: Some("0400 000 001".to_string()),
            address: Some("1 Example Street, Brunswick VIC 3056".to_string()),
        })
        .await?;
    clients
        .create(CreateClientInput {
            tenant_id: tenant.id,
            first_name: "Riley".to_string(),
            last_name: "Nguyen".to_string(),
            ndis_number: Some("430000002".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1975, 11, 2),
            phone: None,
            address: None,
        })
        .await?;

    let start = next_monday_at(9)?;
    let series = ShiftRepository::new(db.clone())
        .create_series(
            CreateShiftInput {
                tenant_id: tenant.id,
                title: "Morning personal care".to_string(),
                client_id: Some(jordan.id),
                assigned_user_id: Some(worker.id),
                start_time: start,
                end_time: start + Duration::hours(3),
                notes: None,
                created_by: Some(admin.id),
            },
            RecurrenceRule {
                frequency: RepeatUnit::Weekly,
                end: RecurrenceEnd::AfterOccurrences { count: 8 },
            },
        )
        .await?;
    println!(
        "  Created {} weekly shifts in series {}",
        series.shifts.len(),
        series.series_id
    );
    Ok(())
}

fn next_monday_at(hour: u32) -> anyhow::Result<NaiveDateTime> {
    let today = Utc::now().date_naive();
    let days_ahead = 7 - i64::from(today.weekday().num_days_from_monday());
    (today + Duration::days(days_ahead))
        .and_hms_opt(hour, 0, 0)
        .context("invalid shift start hour")
}
