//! Postgres repository implementation using Diesel.
//!
//! Uniqueness (favorites, comment likes, usernames, makes, cars) and cascade
//! deletes are enforced by the schema in `migrations/`; unique violations
//! surface as [`RepositoryError::ConflictError`].
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::{count_star, max, min};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::sql_types::{Array, Int4, Int8, Nullable, Numeric, Text};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::task;

use crate::api::{CarId, CommentId, UserId};
use crate::db::repository::{
    AccountRepository, CatalogueRepository, CommentRepository, EngagementRepository,
    ErrorContext, RepositoryError, RepositoryResult,
};
use crate::models::{
    Car, CarFilter, CarListing, CarMake, CatalogueFacets, Comment, CommentLike, CommentRecord,
    Favorite, FavoriteListing, NewCar, NewCarMake, NewComment, NewUser, Session, User,
    UserCommentRecord,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Car columns, make name and both aggregate counts in one pass.
const LISTING_SELECT: &str = "SELECT c.id, c.make_id, c.name, c.description, c.car_type, \
     c.year, c.price, c.image_url, c.created_at, c.updated_at, m.name AS make_name, \
     (SELECT COUNT(*) FROM favorites f WHERE f.car_id = c.id) AS favorite_count, \
     (SELECT COUNT(*) FROM comments cm WHERE cm.car_id = c.id) AS comment_count \
     FROM cars c JOIN car_makes m ON m.id = c.make_id";

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// Only the connection string is required; see the module docs for the
    /// tuning variables and their defaults.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Diesel-backed repository for Postgres.
///
/// Pooled connections, retry with exponential backoff for transient
/// failures, and migrations applied on construction.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// # Arguments
    /// * `config` - Database configuration
    ///
    /// # Returns
    /// * `Ok(PostgresRepository)` on success
    /// * `Err(RepositoryError)` if connection or migration fails
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self { pool, config })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Run `f` on a pooled connection inside `spawn_blocking`, retrying
    /// transient failures.
    ///
    /// Only for reads, deletes, updates and upserts, which may run twice.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        self.run(Retry::Transient, f).await
    }

    /// Run a plain insert. Failures of the statement itself are not retried:
    /// if the commit landed but the acknowledgement was lost, a second run
    /// would report a conflict on the caller's own row.
    async fn with_conn_once<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        self.run(Retry::Never, f).await
    }

    async fn run<T, F>(&self, retry: Retry, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                // Checkout failures happen before the statement runs, so they
                // are retried for every kind of operation.
                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        return Err(err);
                    }
                };

                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if retry.should_retry(&e, attempt, max_retries) => {
                        log::debug!("Retrying after transient error: {}", e);
                        last_error = Some(e);
                    }
                    Err(e) => return Err(e),
                }
            }

            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }
}

/// Whether a statement may run again after a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Retry {
    Transient,
    Never,
}

impl Retry {
    fn should_retry(self, err: &RepositoryError, attempt: u32, max_retries: u32) -> bool {
        self == Retry::Transient && err.is_retryable() && attempt < max_retries
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

/// `%needle%` for ILIKE with the pattern metacharacters escaped.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn rows_to_listings(rows: Vec<CarListingRow>) -> RepositoryResult<Vec<CarListing>> {
    rows.into_iter().map(CarListing::try_from).collect()
}

/// Like totals per comment, from one grouped query.
fn like_counts_for(
    conn: &mut PgConnection,
    comment_ids: &[i64],
) -> RepositoryResult<HashMap<i64, i64>> {
    if comment_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(i64, i64)> = comment_likes::table
        .filter(comment_likes::comment_id.eq_any(comment_ids))
        .group_by(comment_likes::comment_id)
        .select((comment_likes::comment_id, count_star()))
        .load(conn)
        .map_err(map_diesel_error)?;
    Ok(rows.into_iter().collect())
}

fn listings_by_id(
    conn: &mut PgConnection,
    car_ids: Vec<i64>,
) -> RepositoryResult<HashMap<i64, CarListing>> {
    let rows: Vec<CarListingRow> = sql_query(format!("{} WHERE c.id = ANY($1)", LISTING_SELECT))
        .bind::<Array<Int8>, _>(car_ids)
        .load(conn)
        .map_err(map_diesel_error)?;
    rows_to_listings(rows).map(|listings| {
        listings
            .into_iter()
            .map(|l| (l.car.id.value(), l))
            .collect()
    })
}

#[async_trait]
impl CatalogueRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn count_cars(&self) -> RepositoryResult<i64> {
        self.with_conn(|conn| {
            cars::table
                .count()
                .get_result::<i64>(conn)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_or_create_make(&self, make: &NewCarMake) -> RepositoryResult<CarMake> {
        let make = make.clone();
        self.with_conn(move |conn| {
            diesel::insert_into(car_makes::table)
                .values(&NewCarMakeRow {
                    name: &make.name,
                    description: &make.description,
                })
                .on_conflict(car_makes::name)
                .do_nothing()
                .execute(conn)
                .map_err(map_diesel_error)?;

            car_makes::table
                .filter(car_makes::name.eq(&make.name))
                .select(CarMakeRow::as_select())
                .first::<CarMakeRow>(conn)
                .map(CarMake::from)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_or_create_car(&self, car: &NewCar) -> RepositoryResult<Car> {
        car.validate().map_err(|msg| {
            RepositoryError::validation_with_context(
                msg,
                ErrorContext::new("get_or_create_car").with_entity("car"),
            )
        })?;

        let car = car.clone();
        self.with_conn(move |conn| {
            let make_id = car.make_id.value();
            diesel::insert_into(cars::table)
                .values(&NewCarRow {
                    make_id,
                    name: &car.name,
                    description: &car.description,
                    car_type: car.car_type.as_str(),
                    year: car.year,
                    price: car.price.round_dp(2),
                    image_url: &car.image_url,
                })
                .on_conflict((cars::make_id, cars::name, cars::year))
                .do_nothing()
                .execute(conn)
                .map_err(map_diesel_error)?;

            let row = cars::table
                .filter(cars::make_id.eq(make_id))
                .filter(cars::name.eq(&car.name))
                .filter(cars::year.eq(car.year))
                .select(CarRow::as_select())
                .first::<CarRow>(conn)
                .map_err(map_diesel_error)?;
            Car::try_from(row)
        })
        .await
    }

    async fn car_exists(&self, car_id: CarId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            diesel::select(diesel::dsl::exists(cars::table.find(car_id.value())))
                .get_result::<bool>(conn)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_car_listing(&self, car_id: CarId) -> RepositoryResult<Option<CarListing>> {
        self.with_conn(move |conn| {
            let row: Option<CarListingRow> =
                sql_query(format!("{} WHERE c.id = $1", LISTING_SELECT))
                    .bind::<Int8, _>(car_id.value())
                    .get_result(conn)
                    .optional()
                    .map_err(map_diesel_error)?;
            row.map(CarListing::try_from).transpose()
        })
        .await
    }

    async fn list_car_listings(&self, filter: &CarFilter) -> RepositoryResult<Vec<CarListing>> {
        let search = filter.search.as_deref().map(like_pattern);
        let brand = filter.brand.as_ref().map(|b| b.trim().to_string());
        let (price_min, price_max) = (filter.price_min, filter.price_max);
        let (year_min, year_max) = (filter.year_min, filter.year_max);

        self.with_conn(move |conn| {
            let query = format!(
                "{} WHERE ($1::text IS NULL OR c.name ILIKE $1 OR m.name ILIKE $1) \
                 AND ($2::text IS NULL OR LOWER(m.name) = LOWER($2)) \
                 AND ($3::numeric IS NULL OR c.price >= $3) \
                 AND ($4::numeric IS NULL OR c.price <= $4) \
                 AND ($5::int4 IS NULL OR c.year >= $5) \
                 AND ($6::int4 IS NULL OR c.year <= $6) \
                 ORDER BY m.name ASC, c.name ASC, c.id ASC",
                LISTING_SELECT
            );
            let rows: Vec<CarListingRow> = sql_query(query)
                .bind::<Nullable<Text>, _>(search)
                .bind::<Nullable<Text>, _>(brand)
                .bind::<Nullable<Numeric>, _>(price_min)
                .bind::<Nullable<Numeric>, _>(price_max)
                .bind::<Nullable<Int4>, _>(year_min)
                .bind::<Nullable<Int4>, _>(year_max)
                .load(conn)
                .map_err(map_diesel_error)?;
            rows_to_listings(rows)
        })
        .await
    }

    async fn catalogue_facets(&self) -> RepositoryResult<CatalogueFacets> {
        self.with_conn(|conn| {
            let brands: Vec<String> = car_makes::table
                .inner_join(cars::table)
                .select(car_makes::name)
                .distinct()
                .order(car_makes::name.asc())
                .load(conn)
                .map_err(map_diesel_error)?;

            let years: Vec<i32> = cars::table
                .select(cars::year)
                .distinct()
                .order(cars::year.desc())
                .load(conn)
                .map_err(map_diesel_error)?;

            let (price_min, price_max): (Option<Decimal>, Option<Decimal>) = cars::table
                .select((min(cars::price), max(cars::price)))
                .first(conn)
                .map_err(map_diesel_error)?;

            Ok(CatalogueFacets {
                brands,
                years,
                price_min,
                price_max,
            })
        })
        .await
    }

    async fn list_cars_with_makes(&self) -> RepositoryResult<Vec<(Car, CarMake)>> {
        self.with_conn(|conn| {
            let rows: Vec<(CarRow, CarMakeRow)> = cars::table
                .inner_join(car_makes::table)
                .select((CarRow::as_select(), CarMakeRow::as_select()))
                .order(cars::id.asc())
                .load(conn)
                .map_err(map_diesel_error)?;
            rows.into_iter()
                .map(|(car, make)| -> RepositoryResult<(Car, CarMake)> {
                    Ok((Car::try_from(car)?, CarMake::from(make)))
                })
                .collect()
        })
        .await
    }
}

#[async_trait]
impl CommentRepository for PostgresRepository {
    async fn list_comments_for_car(&self, car_id: CarId) -> RepositoryResult<Vec<CommentRecord>> {
        self.with_conn(move |conn| {
            let rows: Vec<(CommentRow, UserRow)> = comments::table
                .inner_join(users::table)
                .filter(comments::car_id.eq(car_id.value()))
                .order((comments::created_at.asc(), comments::id.asc()))
                .select((CommentRow::as_select(), UserRow::as_select()))
                .load(conn)
                .map_err(map_diesel_error)?;

            let ids: Vec<i64> = rows.iter().map(|(c, _)| c.id).collect();
            let counts = like_counts_for(conn, &ids)?;

            Ok(rows
                .into_iter()
                .map(|(comment, author)| CommentRecord {
                    like_count: counts.get(&comment.id).copied().unwrap_or(0),
                    comment: Comment::from(comment),
                    author: author.into(),
                })
                .collect())
        })
        .await
    }

    async fn liked_comment_ids(
        &self,
        user_id: UserId,
        car_id: CarId,
    ) -> RepositoryResult<HashSet<CommentId>> {
        self.with_conn(move |conn| {
            let ids: Vec<i64> = comment_likes::table
                .inner_join(comments::table)
                .filter(comment_likes::user_id.eq(user_id.value()))
                .filter(comments::car_id.eq(car_id.value()))
                .select(comment_likes::comment_id)
                .load(conn)
                .map_err(map_diesel_error)?;
            Ok(ids.into_iter().map(CommentId::new).collect())
        })
        .await
    }

    async fn get_comment(&self, comment_id: CommentId) -> RepositoryResult<Option<CommentRecord>> {
        self.with_conn(move |conn| {
            let row: Option<(CommentRow, UserRow)> = comments::table
                .inner_join(users::table)
                .filter(comments::id.eq(comment_id.value()))
                .select((CommentRow::as_select(), UserRow::as_select()))
                .first(conn)
                .optional()
                .map_err(map_diesel_error)?;

            let Some((comment, author)) = row else {
                return Ok(None);
            };
            let like_count = comment_likes::table
                .filter(comment_likes::comment_id.eq(comment.id))
                .count()
                .get_result::<i64>(conn)
                .map_err(map_diesel_error)?;

            Ok(Some(CommentRecord {
                comment: comment.into(),
                author: author.into(),
                like_count,
            }))
        })
        .await
    }

    async fn create_comment(&self, comment: &NewComment) -> RepositoryResult<Comment> {
        let comment = comment.clone();
        self.with_conn_once(move |conn| {
            diesel::insert_into(comments::table)
                .values(&NewCommentRow {
                    car_id: comment.car_id.value(),
                    user_id: comment.user_id.value(),
                    parent_id: comment.parent_id.map(|p| p.value()),
                    content: &comment.content,
                })
                .returning(CommentRow::as_returning())
                .get_result(conn)
                .map(Comment::from)
                .map_err(|e| map_diesel_error(e).with_operation("create_comment"))
        })
        .await
    }

    async fn update_comment_content(
        &self,
        comment_id: CommentId,
        content: &str,
    ) -> RepositoryResult<Comment> {
        let content = content.to_string();
        self.with_conn(move |conn| {
            diesel::update(comments::table.find(comment_id.value()))
                .set((
                    comments::content.eq(&content),
                    comments::updated_at.eq(Utc::now()),
                ))
                .returning(CommentRow::as_returning())
                .get_result(conn)
                .map(Comment::from)
                .map_err(|e| map_diesel_error(e).with_operation("update_comment_content"))
        })
        .await
    }

    async fn delete_comment(&self, comment_id: CommentId) -> RepositoryResult<bool> {
        // Replies and likes go with it through ON DELETE CASCADE.
        self.with_conn(move |conn| {
            diesel::delete(comments::table.find(comment_id.value()))
                .execute(conn)
                .map(|n| n > 0)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn comments_by_user(&self, user_id: UserId) -> RepositoryResult<Vec<UserCommentRecord>> {
        self.with_conn(move |conn| {
            let rows: Vec<(CommentRow, String, String)> = comments::table
                .inner_join(cars::table.inner_join(car_makes::table))
                .filter(comments::user_id.eq(user_id.value()))
                .order((comments::created_at.desc(), comments::id.desc()))
                .select((CommentRow::as_select(), cars::name, car_makes::name))
                .load(conn)
                .map_err(map_diesel_error)?;

            let ids: Vec<i64> = rows.iter().map(|(c, _, _)| c.id).collect();
            let counts = like_counts_for(conn, &ids)?;

            Ok(rows
                .into_iter()
                .map(|(comment, car_name, make_name)| UserCommentRecord {
                    like_count: counts.get(&comment.id).copied().unwrap_or(0),
                    comment: comment.into(),
                    car_name,
                    make_name,
                })
                .collect())
        })
        .await
    }
}

#[async_trait]
impl EngagementRepository for PostgresRepository {
    async fn insert_favorite(&self, user_id: UserId, car_id: CarId) -> RepositoryResult<Favorite> {
        self.with_conn_once(move |conn| {
            diesel::insert_into(favorites::table)
                .values((
                    favorites::user_id.eq(user_id.value()),
                    favorites::car_id.eq(car_id.value()),
                ))
                .returning(FavoriteRow::as_returning())
                .get_result(conn)
                .map(Favorite::from)
                .map_err(|e| map_diesel_error(e).with_operation("insert_favorite"))
        })
        .await
    }

    async fn delete_favorite(&self, user_id: UserId, car_id: CarId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            diesel::delete(
                favorites::table
                    .filter(favorites::user_id.eq(user_id.value()))
                    .filter(favorites::car_id.eq(car_id.value())),
            )
            .execute(conn)
            .map(|n| n > 0)
            .map_err(map_diesel_error)
        })
        .await
    }

    async fn count_favorites(&self, car_id: CarId) -> RepositoryResult<i64> {
        self.with_conn(move |conn| {
            favorites::table
                .filter(favorites::car_id.eq(car_id.value()))
                .count()
                .get_result::<i64>(conn)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn favorite_car_ids(&self, user_id: UserId) -> RepositoryResult<HashSet<CarId>> {
        self.with_conn(move |conn| {
            let ids: Vec<i64> = favorites::table
                .filter(favorites::user_id.eq(user_id.value()))
                .select(favorites::car_id)
                .load(conn)
                .map_err(map_diesel_error)?;
            Ok(ids.into_iter().map(CarId::new).collect())
        })
        .await
    }

    async fn favorites_for_user(&self, user_id: UserId) -> RepositoryResult<Vec<FavoriteListing>> {
        self.with_conn(move |conn| {
            let rows: Vec<FavoriteRow> = favorites::table
                .filter(favorites::user_id.eq(user_id.value()))
                .order((favorites::created_at.desc(), favorites::id.desc()))
                .select(FavoriteRow::as_select())
                .load(conn)
                .map_err(map_diesel_error)?;

            let mut listings = listings_by_id(conn, rows.iter().map(|f| f.car_id).collect())?;
            Ok(rows
                .into_iter()
                .filter_map(|f| {
                    listings.remove(&f.car_id).map(|listing| FavoriteListing {
                        listing,
                        favorite_since: f.created_at,
                    })
                })
                .collect())
        })
        .await
    }

    async fn insert_comment_like(
        &self,
        user_id: UserId,
        comment_id: CommentId,
    ) -> RepositoryResult<CommentLike> {
        self.with_conn_once(move |conn| {
            diesel::insert_into(comment_likes::table)
                .values((
                    comment_likes::user_id.eq(user_id.value()),
                    comment_likes::comment_id.eq(comment_id.value()),
                ))
                .returning(CommentLikeRow::as_returning())
                .get_result(conn)
                .map(CommentLike::from)
                .map_err(|e| map_diesel_error(e).with_operation("insert_comment_like"))
        })
        .await
    }

    async fn delete_comment_like(
        &self,
        user_id: UserId,
        comment_id: CommentId,
    ) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            diesel::delete(
                comment_likes::table
                    .filter(comment_likes::user_id.eq(user_id.value()))
                    .filter(comment_likes::comment_id.eq(comment_id.value())),
            )
            .execute(conn)
            .map(|n| n > 0)
            .map_err(map_diesel_error)
        })
        .await
    }

    async fn count_comment_likes(&self, comment_id: CommentId) -> RepositoryResult<i64> {
        self.with_conn(move |conn| {
            comment_likes::table
                .filter(comment_likes::comment_id.eq(comment_id.value()))
                .count()
                .get_result::<i64>(conn)
                .map_err(map_diesel_error)
        })
        .await
    }
}

#[async_trait]
impl AccountRepository for PostgresRepository {
    async fn create_user(&self, user: &NewUser) -> RepositoryResult<User> {
        let user = user.clone();
        self.with_conn_once(move |conn| {
            diesel::insert_into(users::table)
                .values(&NewUserRow {
                    username: &user.username,
                    password_hash: &user.password_hash,
                    first_name: &user.first_name,
                    last_name: &user.last_name,
                    email: &user.email,
                    is_staff: user.is_staff,
                })
                .returning(UserRow::as_returning())
                .get_result(conn)
                .map(User::from)
                .map_err(|e| map_diesel_error(e).with_operation("create_user"))
        })
        .await
    }

    async fn find_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        let username = username.to_string();
        self.with_conn(move |conn| {
            users::table
                .filter(users::username.eq(&username))
                .select(UserRow::as_select())
                .first::<UserRow>(conn)
                .optional()
                .map(|row| row.map(User::from))
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_user(&self, user_id: UserId) -> RepositoryResult<Option<User>> {
        self.with_conn(move |conn| {
            users::table
                .find(user_id.value())
                .select(UserRow::as_select())
                .first::<UserRow>(conn)
                .optional()
                .map(|row| row.map(User::from))
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn create_session(&self, session: &Session) -> RepositoryResult<()> {
        let row = SessionRow {
            token: session.token.clone(),
            user_id: session.user_id.value(),
            created_at: session.created_at,
        };
        self.with_conn_once(move |conn| {
            diesel::insert_into(sessions::table)
                .values(&row)
                .execute(conn)
                .map(|_| ())
                .map_err(|e| map_diesel_error(e).with_operation("create_session"))
        })
        .await
    }

    async fn find_session(&self, token: &str) -> RepositoryResult<Option<(Session, User)>> {
        let token = token.to_string();
        self.with_conn(move |conn| {
            sessions::table
                .inner_join(users::table)
                .filter(sessions::token.eq(&token))
                .select((SessionRow::as_select(), UserRow::as_select()))
                .first::<(SessionRow, UserRow)>(conn)
                .optional()
                .map(|row| row.map(|(session, user)| (Session::from(session), User::from(user))))
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn delete_session(&self, token: &str) -> RepositoryResult<bool> {
        let token = token.to_string();
        self.with_conn(move |conn| {
            diesel::delete(sessions::table.find(&token))
                .execute(conn)
                .map(|n| n > 0)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn delete_sessions_before(&self, cutoff: DateTime<Utc>) -> RepositoryResult<usize> {
        self.with_conn(move |conn| {
            diesel::delete(sessions::table.filter(sessions::created_at.lt(cutoff)))
                .execute(conn)
                .map_err(|e| map_diesel_error(e).with_operation("delete_sessions_before"))
        })
        .await
    }
}
