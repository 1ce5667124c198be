//! Database seeder for Recess development and testing.
//!
//! Seeds a test company with a weekend calendar, one leave type, an
//! anniversary accrual policy, and a pair of employees for local
//! development.
//!
//! Usage: cargo run --bin seeder

use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde_json::json;
use uuid::Uuid;

use recess_db::entities::{
    companies, company_holidays, employees, leave_policies, leave_types,
    sea_orm_active_enums::{AccrualMethod, DeductionTiming, MinUnit},
};

/// Test company ID (consistent for all seeds)
const TEST_COMPANY_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Test leave type ID (consistent for all seeds)
const TEST_LEAVE_TYPE_ID: &str = "00000000-0000-0000-0000-000000000002";
/// Full-time test employee ID
const TEST_EMPLOYEE_ID: &str = "00000000-0000-0000-0000-000000000003";
/// Part-time test employee ID
const TEST_PART_TIMER_ID: &str = "00000000-0000-0000-0000-000000000004";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = recess_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding test company...");
    seed_company(&db).await;

    println!("Seeding leave type and policy...");
    seed_leave_type_and_policy(&db).await;

    println!("Seeding employees...");
    seed_employees(&db).await;

    println!("Seeding holidays...");
    seed_holidays(&db).await;

    println!("Seeding complete!");
}

fn company_id() -> Uuid {
    Uuid::parse_str(TEST_COMPANY_ID).unwrap()
}

fn leave_type_id() -> Uuid {
    Uuid::parse_str(TEST_LEAVE_TYPE_ID).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Seeds the test company with a Saturday/Sunday weekend.
async fn seed_company(db: &DatabaseConnection) {
    if companies::Entity::find_by_id(company_id())
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  Test company already exists, skipping...");
        return;
    }

    let company = companies::ActiveModel {
        id: Set(company_id()),
        name: Set("Recess Test Co".to_string()),
        timezone: Set("Asia/Tokyo".to_string()),
        non_working_weekdays: Set(json!([6, 7])),
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
    };

    if let Err(e) = company.insert(db).await {
        eprintln!("Failed to insert test company: {e}");
    } else {
        println!("  Created test company: Recess Test Co");
    }
}

/// Seeds an annual-leave type with an anniversary accrual policy.
async fn seed_leave_type_and_policy(db: &DatabaseConnection) {
    if leave_types::Entity::find_by_id(leave_type_id())
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  Leave type already exists, skipping...");
        return;
    }

    let leave_type = leave_types::ActiveModel {
        id: Set(leave_type_id()),
        company_id: Set(company_id()),
        name: Set("Annual Leave".to_string()),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
    };
    if let Err(e) = leave_type.insert(db).await {
        eprintln!("Failed to insert leave type: {e}");
        return;
    }

    let policy = leave_policies::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(company_id()),
        leave_type_id: Set(leave_type_id()),
        accrual_method: Set(AccrualMethod::Anniversary),
        service_bands: Set(json!([
            {"min_years": 0, "days": "10"},
            {"min_years": 3, "days": "14"},
            {"min_years": 6, "days": "20"},
        ])),
        prorate_part_time: Set(true),
        carryover_max_days: Set(Some(dec!(20))),
        expire_months: Set(24),
        min_unit: Set(MinUnit::OneHour),
        hours_per_day: Set(dec!(8)),
        allow_negative: Set(false),
        deduction_timing: Set(DeductionTiming::Apply),
        business_days_only: Set(true),
        blackout_dates: Set(json!([])),
        grant_month: Set(None),
        grant_day: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
    };
    if let Err(e) = policy.insert(db).await {
        eprintln!("Failed to insert leave policy: {e}");
    } else {
        println!("  Created Annual Leave with anniversary policy");
    }
}

/// Seeds one full-time and one part-time employee.
async fn seed_employees(db: &DatabaseConnection) {
    let seeds = [
        (TEST_EMPLOYEE_ID, "Taro Tanaka", dec!(1), date(2021, 4, 1)),
        (TEST_PART_TIMER_ID, "Hanako Suzuki", dec!(0.5), date(2023, 10, 1)),
    ];

    for (id, name, fte, eligible_from) in seeds {
        let id = Uuid::parse_str(id).unwrap();
        if employees::Entity::find_by_id(id)
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some()
        {
            println!("  Employee {name} already exists, skipping...");
            continue;
        }

        let employee = employees::ActiveModel {
            id: Set(id),
            company_id: Set(company_id()),
            display_name: Set(name.to_string()),
            eligible_from: Set(eligible_from),
            fte_ratio: Set(fte),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
        };
        if let Err(e) = employee.insert(db).await {
            eprintln!("Failed to insert employee {name}: {e}");
        } else {
            println!("  Created employee: {name}");
        }
    }
}

/// Seeds a few public holidays for the test company.
async fn seed_holidays(db: &DatabaseConnection) {
    let holidays = [
        (date(2026, 1, 1), "New Year's Day"),
        (date(2026, 5, 5), "Children's Day"),
        (date(2026, 11, 23), "Labor Thanksgiving Day"),
    ];

    for (holiday_date, name) in holidays {
        let row = company_holidays::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company_id()),
            holiday_date: Set(holiday_date),
            name: Set(Some(name.to_string())),
            created_at: Set(Utc::now().into()),
        };
        // Unique constraint makes re-seeding a no-op
        if row.insert(db).await.is_ok() {
            println!("  Created holiday: {name}");
        }
    }
}
