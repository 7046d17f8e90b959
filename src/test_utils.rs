//! Shared fixtures for service tests: an in-memory SQLite database migrated
//! from scratch, plus helpers that insert minimal rows.

use crate::entities::*;
use chrono::{NaiveDate, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

pub const TEST_PASSWORD: &str = "Password123";

pub async fn setup_test_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    // every pooled connection would otherwise get its own empty database
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn create_user(db: &DatabaseConnection, phone: &str) -> user_entity::Model {
    let now = Utc::now();
    user_entity::ActiveModel {
        phone_number: Set(phone.to_string()),
        first_name: Set("Sara".to_string()),
        last_name: Set("Ahmadi".to_string()),
        email: Set(String::new()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_staff(
    db: &DatabaseConnection,
    phone: &str,
    is_admin: bool,
) -> apollonyar_entity::Model {
    let now = Utc::now();
    apollonyar_entity::ActiveModel {
        first_name: Set("Reza".to_string()),
        last_name: Set(format!("Staff{}", &phone[phone.len() - 2..])),
        phone_number: Set(phone.to_string()),
        // low cost keeps the suite fast
        password_hash: Set(bcrypt::hash(TEST_PASSWORD, 4).unwrap()),
        telegram_id: Set(Some("@reza".to_string())),
        is_admin: Set(is_admin),
        is_blocked: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_course(db: &DatabaseConnection, name: &str) -> course_entity::Model {
    let now = Utc::now();
    course_entity::ActiveModel {
        name: Set(name.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_term(
    db: &DatabaseConnection,
    course_id: i32,
    name: &str,
    price: i64,
) -> term_entity::Model {
    let now = Utc::now();
    term_entity::ActiveModel {
        course_id: Set(course_id),
        name: Set(name.to_string()),
        price: Set(price),
        start_date: Set(date(2025, 9, 1)),
        end_date: Set(date(2025, 12, 1)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_group(db: &DatabaseConnection, term_id: i32, title: &str) -> group_entity::Model {
    let now = Utc::now();
    group_entity::ActiveModel {
        term_id: Set(term_id),
        title: Set(title.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_profile(
    db: &DatabaseConnection,
    user_id: i32,
    course_id: i32,
    term_id: Option<i32>,
) -> profile_entity::Model {
    let now = Utc::now();
    profile_entity::ActiveModel {
        user_id: Set(user_id),
        course_id: Set(course_id),
        term_id: Set(term_id),
        profile_type: Set(ProfileType::TermBased),
        status: Set(ProfileStatus::Active),
        hearts: Set(profiles::DEFAULT_HEARTS),
        stars: Set(0.0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_transaction(
    db: &DatabaseConnection,
    user_id: i32,
    amount: i64,
) -> transaction_entity::Model {
    let now = Utc::now();
    transaction_entity::ActiveModel {
        target_user_id: Set(user_id),
        amount: Set(amount),
        transaction_type: Set(TransactionType::Deposit),
        timestamp: Set(now),
        payment_method: Set(PaymentMethod::Card),
        verification_status: Set(VerificationStatus::Pending),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// A student enrolled in a priced term: (user, course, term, profile)
pub async fn enrolled_student(
    db: &DatabaseConnection,
    phone: &str,
) -> (
    user_entity::Model,
    course_entity::Model,
    term_entity::Model,
    profile_entity::Model,
) {
    let user = create_user(db, phone).await;
    let course = create_course(db, "Piano").await;
    let term = create_term(db, course.id, "Term 1", 9_000_000).await;
    let profile = create_profile(db, user.id, course.id, Some(term.id)).await;
    (user, course, term, profile)
}
