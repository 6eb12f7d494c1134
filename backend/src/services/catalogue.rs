//! Catalogue queries: filtered listings, facets, detail and the legacy list.

use std::collections::HashSet;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::{CarDetailResponse, CarId, CarListResponse, CarSummary, CatalogueFilters, UserId};
use crate::db::repository::{CatalogueRepository, EngagementRepository};
use crate::models::CarFilter;
use crate::routes::cars::{LegacyCarModel, LegacyCarModelsResponse};

use super::error::{ServiceError, ServiceResult};

/// Raw catalogue query string parameters.
///
/// Kept as strings so that a malformed number drops that one criterion
/// instead of rejecting the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogueQuery {
    pub search: Option<String>,
    pub brand: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub year_min: Option<String>,
    pub year_max: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_lenient<T: FromStr>(value: Option<&str>) -> Option<T> {
    non_blank(value).and_then(|v| v.trim().parse().ok())
}

impl CatalogueQuery {
    /// Build the repository filter, ignoring blank and unparseable values.
    pub fn to_filter(&self) -> CarFilter {
        CarFilter {
            search: non_blank(self.search.as_deref()).map(str::to_string),
            brand: non_blank(self.brand.as_deref()).map(|b| b.trim().to_string()),
            price_min: parse_lenient::<Decimal>(self.price_min.as_deref()),
            price_max: parse_lenient::<Decimal>(self.price_max.as_deref()),
            year_min: parse_lenient(self.year_min.as_deref()),
            year_max: parse_lenient(self.year_max.as_deref()),
        }
    }
}

/// List cars matching `query` together with the catalogue-wide facets.
///
/// `is_favorite` is set on every summary only when `viewer` is known.
pub async fn list_cars<R>(
    repo: &R,
    query: &CatalogueQuery,
    viewer: Option<UserId>,
) -> ServiceResult<CarListResponse>
where
    R: CatalogueRepository + EngagementRepository + ?Sized,
{
    let filter = query.to_filter();
    let listings = repo.list_car_listings(&filter).await?;
    let favorites: Option<HashSet<CarId>> = match viewer {
        Some(user_id) => Some(repo.favorite_car_ids(user_id).await?),
        None => None,
    };
    let facets = repo.catalogue_facets().await?;

    let cars = listings
        .iter()
        .map(|listing| {
            let is_favorite = favorites.as_ref().map(|ids| ids.contains(&listing.car.id));
            CarSummary::from_listing(listing, is_favorite)
        })
        .collect::<Vec<_>>();

    log::debug!("Catalogue query {:?} matched {} cars", filter, cars.len());
    Ok(CarListResponse {
        cars,
        filters: CatalogueFilters::from(facets),
    })
}

/// Fetch one car with its description.
pub async fn car_detail<R>(
    repo: &R,
    car_id: CarId,
    viewer: Option<UserId>,
) -> ServiceResult<CarDetailResponse>
where
    R: CatalogueRepository + EngagementRepository + ?Sized,
{
    let listing = repo
        .get_car_listing(car_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Car not found"))?;

    let is_favorite = match viewer {
        Some(user_id) => Some(repo.favorite_car_ids(user_id).await?.contains(&car_id)),
        None => None,
    };
    let description = listing.car.description.clone();
    Ok(CarDetailResponse {
        car: CarSummary::from_listing(&listing, is_favorite).with_description(description),
    })
}

/// Every car as `{CarModel, CarMake}` for the legacy front-end.
pub async fn legacy_car_models<R>(repo: &R) -> ServiceResult<LegacyCarModelsResponse>
where
    R: CatalogueRepository + ?Sized,
{
    let car_models = repo
        .list_cars_with_makes()
        .await?
        .into_iter()
        .map(|(car, make)| LegacyCarModel {
            car_model: car.name,
            car_make: make.name,
        })
        .collect();
    Ok(LegacyCarModelsResponse { car_models })
}
