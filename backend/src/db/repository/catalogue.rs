//! Catalogue repository trait: makes, cars, listings and facets.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::CarId;
use crate::models::{Car, CarFilter, CarListing, CarMake, CatalogueFacets, NewCar, NewCarMake};

/// Repository trait for the car catalogue.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait CatalogueRepository: Send + Sync {
    /// Check if the storage backend is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Total number of cars stored.
    async fn count_cars(&self) -> RepositoryResult<i64>;

    /// Return the make with this name, creating it when absent.
    ///
    /// Safe to call concurrently: a racing insert resolves to the row that
    /// won.
    async fn get_or_create_make(&self, make: &NewCarMake) -> RepositoryResult<CarMake>;

    /// Return the car matching (make, name, year), creating it when absent.
    async fn get_or_create_car(&self, car: &NewCar) -> RepositoryResult<Car>;

    /// Whether a car with this id exists.
    async fn car_exists(&self, car_id: CarId) -> RepositoryResult<bool>;

    /// Fetch one car with its make name and aggregate counts.
    ///
    /// # Returns
    /// * `Ok(Some(listing))` when the car exists
    /// * `Ok(None)` when it does not
    async fn get_car_listing(&self, car_id: CarId) -> RepositoryResult<Option<CarListing>>;

    /// List cars matching `filter`, ordered by make name then car name.
    ///
    /// Favorite and comment counts are computed in the same query.
    async fn list_car_listings(&self, filter: &CarFilter) -> RepositoryResult<Vec<CarListing>>;

    /// Brand, year and price facets over the unfiltered catalogue.
    async fn catalogue_facets(&self) -> RepositoryResult<CatalogueFacets>;

    /// Every car with its make, in insertion order. Feeds the legacy car list.
    async fn list_cars_with_makes(&self) -> RepositoryResult<Vec<(Car, CarMake)>>;
}
