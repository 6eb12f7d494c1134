//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}


// =============================================================================
// Fixtures
// =============================================================================

use dealership::api::CarId;
use dealership::db::repository::{AccountRepository, CatalogueRepository};
use dealership::models::{CarType, NewCar, NewCarMake, NewUser, User};
use dealership::services::accounts::hash_password;
use rust_decimal::Decimal;

pub const PASSWORD: &str = "correct horse";

/// Create a user whose password is [`PASSWORD`].
pub async fn create_user<R>(repo: &R, username: &str, is_staff: bool) -> User
where
    R: AccountRepository + ?Sized,
{
    repo.create_user(&NewUser {
        username: username.to_string(),
        password_hash: hash_password(PASSWORD),
        first_name: String::new(),
        last_name: String::new(),
        email: format!("{}@example.com", username),
        is_staff,
    })
    .await
    .expect("create user")
}

/// Insert a car (and its make when new). Price is in whole currency units.
pub async fn add_car<R>(repo: &R, make: &str, name: &str, year: i32, price: i64) -> CarId
where
    R: CatalogueRepository + ?Sized,
{
    let make = repo
        .get_or_create_make(&NewCarMake {
            name: make.to_string(),
            description: String::new(),
        })
        .await
        .expect("create make");
    repo.get_or_create_car(&NewCar {
        make_id: make.id,
        name: name.to_string(),
        description: format!("{} description", name),
        car_type: CarType::Sport,
        year,
        price: Decimal::new(price, 0),
        image_url: String::new(),
    })
    .await
    .expect("create car")
    .id
}

/// Ferrari SF90 Stradale (2023, 625000) and Porsche 911 Turbo S (2024, 207000).
pub async fn ferrari_and_porsche<R>(repo: &R) -> (CarId, CarId)
where
    R: CatalogueRepository + ?Sized,
{
    let ferrari = add_car(repo, "Ferrari", "SF90 Stradale", 2023, 625_000).await;
    let porsche = add_car(repo, "Porsche", "911 Turbo S", 2024, 207_000).await;
    (ferrari, porsche)
}
