use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::CarId;
use crate::models::{CarListing, CarType, CatalogueFacets};

pub const LIST_CARS: &str = "/api/cars/";
pub const CAR_DETAIL: &str = "/api/cars/{car_id}/";
pub const LEGACY_GET_CARS: &str = "/djangoapp/get_cars";

/// Catalogue entry as returned by the listing, detail, and profile endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarSummary {
    pub id: CarId,
    pub name: String,
    pub brand: String,
    pub year: i32,
    #[serde(rename = "type")]
    pub car_type: CarType,
    pub price: f64,
    pub image_url: String,
    pub favorite_count: i64,
    pub comment_count: i64,
    /// Present only when the requester is authenticated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    /// Present only on the detail endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CarSummary {
    pub fn from_listing(listing: &CarListing, is_favorite: Option<bool>) -> Self {
        Self {
            id: listing.car.id,
            name: listing.car.name.clone(),
            brand: listing.make_name.clone(),
            year: listing.car.year,
            car_type: listing.car.car_type,
            price: decimal_to_f64(listing.car.price),
            image_url: listing.car.image_url.clone(),
            favorite_count: listing.favorite_count,
            comment_count: listing.comment_count,
            is_favorite,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

pub(crate) fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// Global price bounds; both null on an empty catalogue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Filter options over the whole catalogue, independent of the active filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogueFilters {
    pub brands: Vec<String>,
    pub years: Vec<i32>,
    pub price: PriceRange,
}

impl From<CatalogueFacets> for CatalogueFilters {
    fn from(facets: CatalogueFacets) -> Self {
        Self {
            brands: facets.brands,
            years: facets.years,
            price: PriceRange {
                min: facets.price_min.map(decimal_to_f64),
                max: facets.price_max.map(decimal_to_f64),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarListResponse {
    pub cars: Vec<CarSummary>,
    pub filters: CatalogueFilters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarDetailResponse {
    pub car: CarSummary,
}

/// Entry of the legacy `get_cars` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyCarModel {
    #[serde(rename = "CarModel")]
    pub car_model: String,
    #[serde(rename = "CarMake")]
    pub car_make: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyCarModelsResponse {
    #[serde(rename = "CarModels")]
    pub car_models: Vec<LegacyCarModel>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CarMakeId;
    use crate::models::Car;
    use chrono::Utc;
    use std::str::FromStr;

    fn listing() -> CarListing {
        CarListing {
            car: Car {
                id: CarId::new(5),
                make_id: CarMakeId::new(2),
                name: "911 Turbo S".to_string(),
                description: "Iconic".to_string(),
                car_type: CarType::Sport,
                year: 2024,
                price: Decimal::from_str("207000.00").unwrap(),
                image_url: "https://example.com/911.jpg".to_string(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            make_name: "Porsche".to_string(),
            favorite_count: 3,
            comment_count: 1,
        }
    }

    #[test]
    fn test_summary_json_shape() {
        let summary = CarSummary::from_listing(&listing(), None);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["brand"], "Porsche");
        assert_eq!(json["type"], "SPORT");
        assert_eq!(json["price"], 207000.0);
        assert_eq!(json["favorite_count"], 3);
        assert!(json.get("is_favorite").is_none());
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_summary_with_favorite_and_description() {
        let summary = CarSummary::from_listing(&listing(), Some(true)).with_description("Iconic");
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["is_favorite"], true);
        assert_eq!(json["description"], "Iconic");
    }

    #[test]
    fn test_empty_facets_produce_null_prices() {
        let filters = CatalogueFilters::from(CatalogueFacets::default());
        let json = serde_json::to_value(&filters).unwrap();
        assert!(json["price"]["min"].is_null());
        assert!(json["price"]["max"].is_null());
    }

    #[test]
    fn test_legacy_field_names() {
        let response = LegacyCarModelsResponse {
            car_models: vec![LegacyCarModel {
                car_model: "MC20".to_string(),
                car_make: "Maserati".to_string(),
            }],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["CarModels"][0]["CarModel"], "MC20");
        assert_eq!(json["CarModels"][0]["CarMake"], "Maserati");
    }
}
