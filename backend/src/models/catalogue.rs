//! Car makes, cars, and the filter/facet shapes used by catalogue queries.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::{CarId, CarMakeId};

/// Oldest model year accepted in the catalogue.
pub const MIN_MODEL_YEAR: i32 = 1990;

/// Newest model year accepted: next year's models may already be listed.
pub fn max_model_year() -> i32 {
    Utc::now().year() + 1
}

/// Body style of a car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CarType {
    Coupe,
    Convertible,
    Sedan,
    Suv,
    Hypercar,
    #[default]
    Sport,
    GrandTourer,
}

impl CarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarType::Coupe => "COUPE",
            CarType::Convertible => "CONVERTIBLE",
            CarType::Sedan => "SEDAN",
            CarType::Suv => "SUV",
            CarType::Hypercar => "HYPERCAR",
            CarType::Sport => "SPORT",
            CarType::GrandTourer => "GRAND_TOURER",
        }
    }
}

impl FromStr for CarType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "COUPE" => Ok(CarType::Coupe),
            "CONVERTIBLE" => Ok(CarType::Convertible),
            "SEDAN" => Ok(CarType::Sedan),
            "SUV" => Ok(CarType::Suv),
            "HYPERCAR" => Ok(CarType::Hypercar),
            "SPORT" => Ok(CarType::Sport),
            "GRAND_TOURER" => Ok(CarType::GrandTourer),
            other => Err(format!("Unknown car type: {}", other)),
        }
    }
}

impl std::fmt::Display for CarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A car manufacturer. Names are unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarMake {
    pub id: CarMakeId,
    pub name: String,
    pub description: String,
}

/// Data required to create a make.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCarMake {
    pub name: String,
    pub description: String,
}

/// A single catalogue entry. Unique on (make, name, year).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub id: CarId,
    pub make_id: CarMakeId,
    pub name: String,
    pub description: String,
    pub car_type: CarType,
    pub year: i32,
    pub price: Decimal,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a car.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCar {
    pub make_id: CarMakeId,
    pub name: String,
    pub description: String,
    pub car_type: CarType,
    pub year: i32,
    pub price: Decimal,
    pub image_url: String,
}

impl NewCar {
    /// Check field constraints before the row reaches storage.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Car name must not be empty".to_string());
        }
        let max_year = max_model_year();
        if self.year < MIN_MODEL_YEAR || self.year > max_year {
            return Err(format!(
                "Car year {} outside [{}, {}]",
                self.year, MIN_MODEL_YEAR, max_year
            ));
        }
        if self.price.is_sign_negative() {
            return Err("Car price must not be negative".to_string());
        }
        Ok(())
    }
}

/// A car joined with its make name and aggregate counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarListing {
    pub car: Car,
    pub make_name: String,
    pub favorite_count: i64,
    pub comment_count: i64,
}

/// Catalogue filter. All criteria are optional and AND-combined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarFilter {
    /// Case-insensitive substring over car name or make name.
    pub search: Option<String>,
    /// Case-insensitive exact make name.
    pub brand: Option<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
}

impl CarFilter {
    /// Evaluate the filter against one car in memory.
    pub fn matches(&self, car: &Car, make_name: &str) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !car.name.to_lowercase().contains(&needle)
                && !make_name.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(brand) = &self.brand {
            if make_name.to_lowercase() != brand.trim().to_lowercase() {
                return false;
            }
        }
        if self.price_min.is_some_and(|min| car.price < min) {
            return false;
        }
        if self.price_max.is_some_and(|max| car.price > max) {
            return false;
        }
        if self.year_min.is_some_and(|min| car.year < min) {
            return false;
        }
        if self.year_max.is_some_and(|max| car.year > max) {
            return false;
        }
        true
    }
}

/// Filter options computed over the whole catalogue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogueFacets {
    /// Makes with at least one car, alphabetical.
    pub brands: Vec<String>,
    /// Distinct model years, newest first.
    pub years: Vec<i32>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    fn car(name: &str, year: i32, price: i64) -> Car {
        Car {
            id: CarId::new(1),
            make_id: CarMakeId::new(1),
            name: name.to_string(),
            description: String::new(),
            car_type: CarType::Sport,
            year,
            price: Decimal::from_i64(price).unwrap(),
            image_url: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_car_type_round_trip_names() {
        assert_eq!("grand_tourer".parse::<CarType>().unwrap(), CarType::GrandTourer);
        assert_eq!(CarType::Suv.as_str(), "SUV");
        assert_eq!(serde_json::to_string(&CarType::Suv).unwrap(), "\"SUV\"");
        assert_eq!(
            serde_json::to_string(&CarType::GrandTourer).unwrap(),
            "\"GRAND_TOURER\""
        );
        assert!("truck".parse::<CarType>().is_err());
        assert_eq!(CarType::default(), CarType::Sport);
    }

    #[test]
    fn test_filter_search_matches_car_or_make() {
        let filter = CarFilter {
            search: Some("turbo".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&car("911 Turbo S", 2024, 207_000), "Porsche"));
        assert!(!filter.matches(&car("SF90 Stradale", 2023, 625_000), "Ferrari"));

        let filter = CarFilter {
            search: Some("FERR".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&car("SF90 Stradale", 2023, 625_000), "Ferrari"));
    }

    #[test]
    fn test_filter_brand_is_exact_case_insensitive() {
        let filter = CarFilter {
            brand: Some(" ferrari ".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&car("SF90 Stradale", 2023, 625_000), "Ferrari"));
        assert!(!filter.matches(&car("Something", 2023, 1), "Ferrari Classiche"));
    }

    #[test]
    fn test_filter_ranges_are_inclusive() {
        let filter = CarFilter {
            price_min: Decimal::from_i64(207_000),
            price_max: Decimal::from_i64(207_000),
            year_min: Some(2024),
            year_max: Some(2024),
            ..Default::default()
        };
        assert!(filter.matches(&car("911 Turbo S", 2024, 207_000), "Porsche"));
        assert!(!filter.matches(&car("911 Turbo S", 2023, 207_000), "Porsche"));
        assert!(!filter.matches(&car("911 Turbo S", 2024, 207_001), "Porsche"));
    }

    #[test]
    fn test_new_car_validation() {
        let mut new_car = NewCar {
            make_id: CarMakeId::new(1),
            name: "MC20".to_string(),
            description: String::new(),
            car_type: CarType::Sport,
            year: 2023,
            price: Decimal::from_i64(212_000).unwrap(),
            image_url: String::new(),
        };
        assert!(new_car.validate().is_ok());

        new_car.year = 1989;
        assert!(new_car.validate().is_err());

        new_car.year = max_model_year() + 1;
        assert!(new_car.validate().is_err());

        new_car.year = max_model_year();
        new_car.price = Decimal::from_i64(-1).unwrap();
        assert!(new_car.validate().is_err());
    }
}
