//! In-memory local repository implementation.
//!
//! Stores every table in memory behind a single `RwLock`, enforcing the same
//! uniqueness and cascade rules as the Postgres schema. Used by default for
//! local development and throughout the test suites.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::api::{CarId, CarMakeId, CommentId, UserId};
use crate::db::repository::*;
use crate::models::*;

/// In-memory local repository.
///
/// # Example
/// ```
/// use dealership::db::repositories::LocalRepository;
/// use dealership::db::repository::CatalogueRepository;
///
/// # tokio_test_block_on(async {
/// let repo = LocalRepository::new();
/// assert_eq!(repo.count_cars().await.unwrap(), 0);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    makes: BTreeMap<CarMakeId, CarMake>,
    cars: BTreeMap<CarId, Car>,
    favorites: HashMap<(UserId, CarId), Favorite>,
    comments: BTreeMap<CommentId, Comment>,
    comment_likes: HashMap<(UserId, CommentId), CommentLike>,
    users: BTreeMap<UserId, User>,
    sessions: HashMap<String, Session>,

    // ID counters
    next_make_id: i64,
    next_car_id: i64,
    next_favorite_id: i64,
    next_comment_id: i64,
    next_like_id: i64,
    next_user_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            makes: BTreeMap::new(),
            cars: BTreeMap::new(),
            favorites: HashMap::new(),
            comments: BTreeMap::new(),
            comment_likes: HashMap::new(),
            users: BTreeMap::new(),
            sessions: HashMap::new(),
            next_make_id: 1,
            next_car_id: 1,
            next_favorite_id: 1,
            next_comment_id: 1,
            next_like_id: 1,
            next_user_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn check_health(&self) -> RepositoryResult<()> {
        if !self.is_healthy {
            return Err(RepositoryError::connection("Database is not healthy"));
        }
        Ok(())
    }

    fn make_name(&self, make_id: CarMakeId) -> String {
        self.makes
            .get(&make_id)
            .map(|m| m.name.clone())
            .unwrap_or_default()
    }

    fn listing(&self, car: &Car) -> CarListing {
        let favorite_count = self
            .favorites
            .values()
            .filter(|f| f.car_id == car.id)
            .count() as i64;
        let comment_count = self
            .comments
            .values()
            .filter(|c| c.car_id == car.id)
            .count() as i64;
        CarListing {
            car: car.clone(),
            make_name: self.make_name(car.make_id),
            favorite_count,
            comment_count,
        }
    }

    fn like_counts(&self) -> HashMap<CommentId, i64> {
        let mut counts = HashMap::new();
        for like in self.comment_likes.values() {
            *counts.entry(like.comment_id).or_insert(0) += 1;
        }
        counts
    }

    fn author(&self, user_id: UserId) -> CommentAuthorRecord {
        match self.users.get(&user_id) {
            Some(user) => CommentAuthorRecord {
                id: user.id,
                username: user.username.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
            },
            None => CommentAuthorRecord {
                id: user_id,
                username: String::new(),
                first_name: String::new(),
                last_name: String::new(),
            },
        }
    }

    fn comment_record(&self, comment: &Comment, counts: &HashMap<CommentId, i64>) -> CommentRecord {
        CommentRecord {
            comment: comment.clone(),
            author: self.author(comment.user_id),
            like_count: counts.get(&comment.id).copied().unwrap_or(0),
        }
    }

    fn require_user(&self, user_id: UserId) -> RepositoryResult<()> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(RepositoryError::not_found_with_context(
                format!("User {} not found", user_id),
                ErrorContext::new("require_user")
                    .with_entity("user")
                    .with_entity_id(user_id),
            ))
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        let is_healthy = data.is_healthy;
        *data = LocalData {
            is_healthy,
            ..Default::default()
        };
    }

    /// Get the number of comments stored.
    pub fn comment_count(&self) -> usize {
        self.data.read().comments.len()
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogueRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn count_cars(&self) -> RepositoryResult<i64> {
        let data = self.data.read();
        data.check_health()?;
        Ok(data.cars.len() as i64)
    }

    async fn get_or_create_make(&self, make: &NewCarMake) -> RepositoryResult<CarMake> {
        let mut data = self.data.write();
        data.check_health()?;

        if let Some(existing) = data.makes.values().find(|m| m.name == make.name) {
            return Ok(existing.clone());
        }

        let id = CarMakeId::new(data.next_make_id);
        data.next_make_id += 1;
        let created = CarMake {
            id,
            name: make.name.clone(),
            description: make.description.clone(),
        };
        data.makes.insert(id, created.clone());
        Ok(created)
    }

    async fn get_or_create_car(&self, car: &NewCar) -> RepositoryResult<Car> {
        car.validate().map_err(|msg| {
            RepositoryError::validation_with_context(
                msg,
                ErrorContext::new("get_or_create_car").with_entity("car"),
            )
        })?;

        let mut data = self.data.write();
        data.check_health()?;

        if !data.makes.contains_key(&car.make_id) {
            return Err(RepositoryError::not_found_with_context(
                format!("Car make {} not found", car.make_id),
                ErrorContext::new("get_or_create_car")
                    .with_entity("car_make")
                    .with_entity_id(car.make_id),
            ));
        }

        if let Some(existing) = data
            .cars
            .values()
            .find(|c| c.make_id == car.make_id && c.name == car.name && c.year == car.year)
        {
            return Ok(existing.clone());
        }

        let id = CarId::new(data.next_car_id);
        data.next_car_id += 1;
        let now = Utc::now();
        let created = Car {
            id,
            make_id: car.make_id,
            name: car.name.clone(),
            description: car.description.clone(),
            car_type: car.car_type,
            year: car.year,
            price: car.price.round_dp(2),
            image_url: car.image_url.clone(),
            created_at: now,
            updated_at: now,
        };
        data.cars.insert(id, created.clone());
        Ok(created)
    }

    async fn car_exists(&self, car_id: CarId) -> RepositoryResult<bool> {
        let data = self.data.read();
        data.check_health()?;
        Ok(data.cars.contains_key(&car_id))
    }

    async fn get_car_listing(&self, car_id: CarId) -> RepositoryResult<Option<CarListing>> {
        let data = self.data.read();
        data.check_health()?;
        Ok(data.cars.get(&car_id).map(|car| data.listing(car)))
    }

    async fn list_car_listings(&self, filter: &CarFilter) -> RepositoryResult<Vec<CarListing>> {
        let data = self.data.read();
        data.check_health()?;

        let mut listings: Vec<CarListing> = data
            .cars
            .values()
            .filter(|car| filter.matches(car, &data.make_name(car.make_id)))
            .map(|car| data.listing(car))
            .collect();

        listings.sort_by(|a, b| {
            a.make_name
                .cmp(&b.make_name)
                .then_with(|| a.car.name.cmp(&b.car.name))
                .then_with(|| a.car.id.cmp(&b.car.id))
        });
        Ok(listings)
    }

    async fn catalogue_facets(&self) -> RepositoryResult<CatalogueFacets> {
        let data = self.data.read();
        data.check_health()?;

        let mut brands: Vec<String> = data
            .cars
            .values()
            .map(|car| data.make_name(car.make_id))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        brands.sort();

        let mut years: Vec<i32> = data
            .cars
            .values()
            .map(|car| car.year)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        years.sort_unstable_by(|a, b| b.cmp(a));

        let prices: Vec<Decimal> = data.cars.values().map(|car| car.price).collect();

        Ok(CatalogueFacets {
            brands,
            years,
            price_min: prices.iter().min().copied(),
            price_max: prices.iter().max().copied(),
        })
    }

    async fn list_cars_with_makes(&self) -> RepositoryResult<Vec<(Car, CarMake)>> {
        let data = self.data.read();
        data.check_health()?;
        Ok(data
            .cars
            .values()
            .filter_map(|car| {
                data.makes
                    .get(&car.make_id)
                    .map(|make| (car.clone(), make.clone()))
            })
            .collect())
    }
}

#[async_trait]
impl CommentRepository for LocalRepository {
    async fn list_comments_for_car(&self, car_id: CarId) -> RepositoryResult<Vec<CommentRecord>> {
        let data = self.data.read();
        data.check_health()?;

        let counts = data.like_counts();
        let mut records: Vec<CommentRecord> = data
            .comments
            .values()
            .filter(|c| c.car_id == car_id)
            .map(|c| data.comment_record(c, &counts))
            .collect();
        records.sort_by(|a, b| {
            a.comment
                .created_at
                .cmp(&b.comment.created_at)
                .then_with(|| a.comment.id.cmp(&b.comment.id))
        });
        Ok(records)
    }

    async fn liked_comment_ids(
        &self,
        user_id: UserId,
        car_id: CarId,
    ) -> RepositoryResult<HashSet<CommentId>> {
        let data = self.data.read();
        data.check_health()?;
        Ok(data
            .comment_likes
            .keys()
            .filter(|(liker, comment_id)| {
                *liker == user_id
                    && data
                        .comments
                        .get(comment_id)
                        .is_some_and(|c| c.car_id == car_id)
            })
            .map(|(_, comment_id)| *comment_id)
            .collect())
    }

    async fn get_comment(&self, comment_id: CommentId) -> RepositoryResult<Option<CommentRecord>> {
        let data = self.data.read();
        data.check_health()?;
        let counts = data.like_counts();
        Ok(data
            .comments
            .get(&comment_id)
            .map(|c| data.comment_record(c, &counts)))
    }

    async fn create_comment(&self, comment: &NewComment) -> RepositoryResult<Comment> {
        let mut data = self.data.write();
        data.check_health()?;

        if !data.cars.contains_key(&comment.car_id) {
            return Err(RepositoryError::not_found_with_context(
                format!("Car {} not found", comment.car_id),
                ErrorContext::new("create_comment")
                    .with_entity("car")
                    .with_entity_id(comment.car_id),
            ));
        }
        data.require_user(comment.user_id)?;
        if let Some(parent_id) = comment.parent_id {
            if !data.comments.contains_key(&parent_id) {
                return Err(RepositoryError::not_found_with_context(
                    format!("Parent comment {} not found", parent_id),
                    ErrorContext::new("create_comment")
                        .with_entity("comment")
                        .with_entity_id(parent_id),
                ));
            }
        }

        let id = CommentId::new(data.next_comment_id);
        data.next_comment_id += 1;
        let now = Utc::now();
        let created = Comment {
            id,
            car_id: comment.car_id,
            user_id: comment.user_id,
            parent_id: comment.parent_id,
            content: comment.content.clone(),
            created_at: now,
            updated_at: now,
        };
        data.comments.insert(id, created.clone());
        Ok(created)
    }

    async fn update_comment_content(
        &self,
        comment_id: CommentId,
        content: &str,
    ) -> RepositoryResult<Comment> {
        let mut data = self.data.write();
        data.check_health()?;

        let comment = data.comments.get_mut(&comment_id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Comment {} not found", comment_id),
                ErrorContext::new("update_comment_content")
                    .with_entity("comment")
                    .with_entity_id(comment_id),
            )
        })?;
        comment.content = content.to_string();
        comment.updated_at = Utc::now();
        Ok(comment.clone())
    }

    async fn delete_comment(&self, comment_id: CommentId) -> RepositoryResult<bool> {
        let mut data = self.data.write();
        data.check_health()?;

        if !data.comments.contains_key(&comment_id) {
            return Ok(false);
        }

        let mut children: HashMap<CommentId, Vec<CommentId>> = HashMap::new();
        for comment in data.comments.values() {
            if let Some(parent_id) = comment.parent_id {
                children.entry(parent_id).or_default().push(comment.id);
            }
        }

        let mut doomed = HashSet::new();
        let mut stack = vec![comment_id];
        while let Some(id) = stack.pop() {
            if !doomed.insert(id) {
                continue;
            }
            if let Some(replies) = children.get(&id) {
                stack.extend(replies.iter().copied());
            }
        }

        data.comments.retain(|id, _| !doomed.contains(id));
        data.comment_likes
            .retain(|(_, liked), _| !doomed.contains(liked));
        log::debug!(
            "Deleted comment {} with {} replies",
            comment_id,
            doomed.len() - 1
        );
        Ok(true)
    }

    async fn comments_by_user(&self, user_id: UserId) -> RepositoryResult<Vec<UserCommentRecord>> {
        let data = self.data.read();
        data.check_health()?;

        let counts = data.like_counts();
        let mut records: Vec<UserCommentRecord> = data
            .comments
            .values()
            .filter(|c| c.user_id == user_id)
            .map(|c| {
                let car = data.cars.get(&c.car_id);
                UserCommentRecord {
                    comment: c.clone(),
                    car_name: car.map(|car| car.name.clone()).unwrap_or_default(),
                    make_name: car
                        .map(|car| data.make_name(car.make_id))
                        .unwrap_or_default(),
                    like_count: counts.get(&c.id).copied().unwrap_or(0),
                }
            })
            .collect();
        records.sort_by(|a, b| {
            b.comment
                .created_at
                .cmp(&a.comment.created_at)
                .then_with(|| b.comment.id.cmp(&a.comment.id))
        });
        Ok(records)
    }
}

#[async_trait]
impl EngagementRepository for LocalRepository {
    async fn insert_favorite(&self, user_id: UserId, car_id: CarId) -> RepositoryResult<Favorite> {
        let mut data = self.data.write();
        data.check_health()?;

        if !data.cars.contains_key(&car_id) {
            return Err(RepositoryError::not_found_with_context(
                format!("Car {} not found", car_id),
                ErrorContext::new("insert_favorite")
                    .with_entity("car")
                    .with_entity_id(car_id),
            ));
        }
        data.require_user(user_id)?;
        if data.favorites.contains_key(&(user_id, car_id)) {
            return Err(RepositoryError::conflict_with_context(
                "Favorite already exists",
                ErrorContext::new("insert_favorite")
                    .with_entity("favorite")
                    .with_details(format!("user_id={}, car_id={}", user_id, car_id)),
            ));
        }

        let favorite = Favorite {
            id: data.next_favorite_id,
            user_id,
            car_id,
            created_at: Utc::now(),
        };
        data.next_favorite_id += 1;
        data.favorites.insert((user_id, car_id), favorite.clone());
        Ok(favorite)
    }

    async fn delete_favorite(&self, user_id: UserId, car_id: CarId) -> RepositoryResult<bool> {
        let mut data = self.data.write();
        data.check_health()?;
        Ok(data.favorites.remove(&(user_id, car_id)).is_some())
    }

    async fn count_favorites(&self, car_id: CarId) -> RepositoryResult<i64> {
        let data = self.data.read();
        data.check_health()?;
        Ok(data.favorites.keys().filter(|(_, c)| *c == car_id).count() as i64)
    }

    async fn favorite_car_ids(&self, user_id: UserId) -> RepositoryResult<HashSet<CarId>> {
        let data = self.data.read();
        data.check_health()?;
        Ok(data
            .favorites
            .keys()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, car_id)| *car_id)
            .collect())
    }

    async fn favorites_for_user(&self, user_id: UserId) -> RepositoryResult<Vec<FavoriteListing>> {
        let data = self.data.read();
        data.check_health()?;

        let mut favorites: Vec<&Favorite> = data
            .favorites
            .values()
            .filter(|f| f.user_id == user_id)
            .collect();
        favorites.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(favorites
            .into_iter()
            .filter_map(|f| {
                data.cars.get(&f.car_id).map(|car| FavoriteListing {
                    listing: data.listing(car),
                    favorite_since: f.created_at,
                })
            })
            .collect())
    }

    async fn insert_comment_like(
        &self,
        user_id: UserId,
        comment_id: CommentId,
    ) -> RepositoryResult<CommentLike> {
        let mut data = self.data.write();
        data.check_health()?;

        if !data.comments.contains_key(&comment_id) {
            return Err(RepositoryError::not_found_with_context(
                format!("Comment {} not found", comment_id),
                ErrorContext::new("insert_comment_like")
                    .with_entity("comment")
                    .with_entity_id(comment_id),
            ));
        }
        data.require_user(user_id)?;
        if data.comment_likes.contains_key(&(user_id, comment_id)) {
            return Err(RepositoryError::conflict_with_context(
                "Comment like already exists",
                ErrorContext::new("insert_comment_like")
                    .with_entity("comment_like")
                    .with_details(format!("user_id={}, comment_id={}", user_id, comment_id)),
            ));
        }

        let like = CommentLike {
            id: data.next_like_id,
            user_id,
            comment_id,
            created_at: Utc::now(),
        };
        data.next_like_id += 1;
        data.comment_likes.insert((user_id, comment_id), like.clone());
        Ok(like)
    }

    async fn delete_comment_like(
        &self,
        user_id: UserId,
        comment_id: CommentId,
    ) -> RepositoryResult<bool> {
        let mut data = self.data.write();
        data.check_health()?;
        Ok(data.comment_likes.remove(&(user_id, comment_id)).is_some())
    }

    async fn count_comment_likes(&self, comment_id: CommentId) -> RepositoryResult<i64> {
        let data = self.data.read();
        data.check_health()?;
        Ok(data
            .comment_likes
            .keys()
            .filter(|(_, c)| *c == comment_id)
            .count() as i64)
    }
}

#[async_trait]
impl AccountRepository for LocalRepository {
    async fn create_user(&self, user: &NewUser) -> RepositoryResult<User> {
        let mut data = self.data.write();
        data.check_health()?;

        if data.users.values().any(|u| u.username == user.username) {
            return Err(RepositoryError::conflict_with_context(
                format!("Username '{}' is already taken", user.username),
                ErrorContext::new("create_user").with_entity("user"),
            ));
        }

        let id = UserId::new(data.next_user_id);
        data.next_user_id += 1;
        let created = User {
            id,
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            is_staff: user.is_staff,
            date_joined: Utc::now(),
        };
        data.users.insert(id, created.clone());
        Ok(created)
    }

    async fn find_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        let data = self.data.read();
        data.check_health()?;
        Ok(data.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_user(&self, user_id: UserId) -> RepositoryResult<Option<User>> {
        let data = self.data.read();
        data.check_health()?;
        Ok(data.users.get(&user_id).cloned())
    }

    async fn create_session(&self, session: &Session) -> RepositoryResult<()> {
        let mut data = self.data.write();
        data.check_health()?;
        data.require_user(session.user_id)?;

        if data.sessions.contains_key(&session.token) {
            return Err(RepositoryError::conflict_with_context(
                "Session token already exists",
                ErrorContext::new("create_session").with_entity("session"),
            ));
        }

        data.sessions.insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, token: &str) -> RepositoryResult<Option<(Session, User)>> {
        let data = self.data.read();
        data.check_health()?;
        Ok(data.sessions.get(token).and_then(|session| {
            data.users
                .get(&session.user_id)
                .map(|user| (session.clone(), user.clone()))
        }))
    }

    async fn delete_session(&self, token: &str) -> RepositoryResult<bool> {
        let mut data = self.data.write();
        data.check_health()?;
        Ok(data.sessions.remove(token).is_some())
    }

    async fn delete_sessions_before(&self, cutoff: DateTime<Utc>) -> RepositoryResult<usize> {
        let mut data = self.data.write();
        data.check_health()?;
        let before = data.sessions.len();
        data.sessions.retain(|_, session| session.created_at >= cutoff);
        Ok(before - data.sessions.len())
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
