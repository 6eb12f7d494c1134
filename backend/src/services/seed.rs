//! Sample catalogue loaded into an empty database.

use std::sync::atomic::{AtomicBool, Ordering};

use rust_decimal::Decimal;

use crate::db::repository::CatalogueRepository;
use crate::models::{CarType, NewCar, NewCarMake};

use super::error::{ServiceError, ServiceResult};

struct SeedModel {
    name: &'static str,
    car_type: CarType,
    year: i32,
    /// Price in cents.
    price_cents: i64,
    description: &'static str,
    image_url: &'static str,
}

struct SeedMake {
    name: &'static str,
    description: &'static str,
    models: &'static [SeedModel],
}

const UNSPLASH_DEFAULT: &str = "https://images.unsplash.com/photo-1503736334956-4c8f8e92946d";

static SAMPLE_CATALOGUE: &[SeedMake] = &[
    SeedMake {
        name: "Ferrari",
        description: "Italian excellence and track-focused engineering.",
        models: &[
            SeedModel {
                name: "SF90 Stradale",
                car_type: CarType::Hypercar,
                year: 2023,
                price_cents: 62_500_000,
                description: "Hybrid flagship blending V8 power with electric performance.",
                image_url: "https://images.unsplash.com/photo-1617813489996-3823bac2c2c8",
            },
            SeedModel {
                name: "F8 Tributo",
                car_type: CarType::Sport,
                year: 2022,
                price_cents: 28_000_000,
                description: "Twin-turbo V8 coupe celebrating Ferrari's mid-engine heritage.",
                image_url: UNSPLASH_DEFAULT,
            },
        ],
    },
    SeedMake {
        name: "Porsche",
        description: "Precision German engineering for road and track.",
        models: &[
            SeedModel {
                name: "911 Turbo S",
                car_type: CarType::Sport,
                year: 2024,
                price_cents: 20_700_000,
                description: "Iconic 911 platform delivering blistering acceleration and grip.",
                image_url: "https://images.unsplash.com/photo-1525609004556-c46c7d6cf023",
            },
            SeedModel {
                name: "Taycan Turbo S",
                car_type: CarType::Sedan,
                year: 2023,
                price_cents: 19_600_000,
                description: "All-electric performance sedan with cutting-edge technology.",
                image_url: "https://images.unsplash.com/photo-1590362891991-f776e747a588",
            },
        ],
    },
    SeedMake {
        name: "Range Rover",
        description: "Luxury SUVs capable of conquering any terrain.",
        models: &[SeedModel {
            name: "Autobiography",
            car_type: CarType::Suv,
            year: 2023,
            price_cents: 15_500_000,
            description: "Flagship SUV balancing refinement with go-anywhere capability.",
            image_url: "https://images.unsplash.com/photo-1592194996308-7b43878e84a6",
        }],
    },
    SeedMake {
        name: "Lamborghini",
        description: "Bold Italian designs with unmistakable presence.",
        models: &[SeedModel {
            name: "Aventador Ultimae",
            car_type: CarType::Hypercar,
            year: 2022,
            price_cents: 49_800_000,
            description: "Final V12 Aventador with dramatic styling and soundtrack.",
            image_url: "https://images.unsplash.com/photo-1549921296-3ecf9c8a3c95",
        }],
    },
    SeedMake {
        name: "Chevrolet",
        description: "American performance icons with everyday usability.",
        models: &[SeedModel {
            name: "Corvette Z06",
            car_type: CarType::Sport,
            year: 2023,
            price_cents: 11_000_000,
            description: "Track-honed Z06 featuring a high-revving flat-plane V8.",
            image_url: "https://images.unsplash.com/photo-1584345604476-8ec61a3e1af4",
        }],
    },
    SeedMake {
        name: "Audi",
        description: "Quattro all-wheel drive technology meets luxury craftsmanship.",
        models: &[SeedModel {
            name: "R8 V10 Performance",
            car_type: CarType::Sport,
            year: 2023,
            price_cents: 21_000_000,
            description: "Naturally aspirated V10 supercar with everyday comfort.",
            image_url: "https://images.unsplash.com/photo-1483721310020-03333e577078",
        }],
    },
    SeedMake {
        name: "Mercedes-Benz AMG",
        description: "Hand-built engines delivering uncompromising performance.",
        models: &[SeedModel {
            name: "GT Black Series",
            car_type: CarType::Sport,
            year: 2021,
            price_cents: 32_500_000,
            description: "Extreme aero and lightweight focus for the track-ready GT.",
            image_url: "https://images.unsplash.com/photo-1553440569-bcc63803a83d",
        }],
    },
    SeedMake {
        name: "BMW",
        description: "Driver-focused dynamics across the entire M portfolio.",
        models: &[SeedModel {
            name: "M8 Competition",
            car_type: CarType::GrandTourer,
            year: 2024,
            price_cents: 13_400_000,
            description: "Powerful grand tourer blending luxury with M engineering.",
            image_url: "https://images.unsplash.com/photo-1600718377522-43259f4b2c94",
        }],
    },
    SeedMake {
        name: "Maserati",
        description: "Italian flair with motorsport-inspired powertrains.",
        models: &[SeedModel {
            name: "MC20",
            car_type: CarType::Sport,
            year: 2023,
            price_cents: 21_200_000,
            description: "Carbon-fibre supercar ushering a new era for Maserati.",
            image_url: "https://images.unsplash.com/photo-1603386329225-868f9fa0c042",
        }],
    },
    SeedMake {
        name: "Aston Martin",
        description: "Handcrafted British grand tourers.",
        models: &[SeedModel {
            name: "DBS Superleggera",
            car_type: CarType::GrandTourer,
            year: 2021,
            price_cents: 31_600_000,
            description: "Twin-turbo V12 grand tourer with timeless style.",
            image_url: "https://images.unsplash.com/photo-1603387202120-4edb7c9fd68f",
        }],
    },
    SeedMake {
        name: "Bentley",
        description: "Ultra-luxury craftsmanship with immense power.",
        models: &[SeedModel {
            name: "Continental GT Speed",
            car_type: CarType::GrandTourer,
            year: 2023,
            price_cents: 27_400_000,
            description: "W12-powered grand tourer with incredible refinement.",
            image_url: "https://images.unsplash.com/photo-1603386443722-b70315ab57f0",
        }],
    },
    SeedMake {
        name: "Rolls-Royce",
        description: "Bespoke luxury and effortless performance.",
        models: &[SeedModel {
            name: "Phantom",
            car_type: CarType::GrandTourer,
            year: 2023,
            price_cents: 46_000_000,
            description: "The pinnacle of chauffeur-driven comfort and presence.",
            image_url: "https://images.unsplash.com/photo-1525609004556-61e16890a23b",
        }],
    },
    SeedMake {
        name: "Jaguar",
        description: "Graceful British sports cars with modern technology.",
        models: &[SeedModel {
            name: "F-Type R",
            car_type: CarType::Sport,
            year: 2023,
            price_cents: 11_800_000,
            description: "Supercharged V8 coupe with dramatic sound and style.",
            image_url: "https://images.unsplash.com/photo-1519648023493-d82b5f8d7fd8",
        }],
    },
    SeedMake {
        name: "Bugatti",
        description: "Record-breaking hypercars with unmatched engineering.",
        models: &[SeedModel {
            name: "Chiron Super Sport",
            car_type: CarType::Hypercar,
            year: 2022,
            price_cents: 390_000_000,
            description: "Quad-turbo W16 delivering extraordinary top speed.",
            image_url: UNSPLASH_DEFAULT,
        }],
    },
    SeedMake {
        name: "McLaren",
        description: "Lightweight carbon innovation born from Formula 1.",
        models: &[SeedModel {
            name: "765LT",
            car_type: CarType::Hypercar,
            year: 2021,
            price_cents: 35_800_000,
            description: "Longtail aerodynamics and extreme track focus.",
            image_url: UNSPLASH_DEFAULT,
        }],
    },
    SeedMake {
        name: "Lexus",
        description: "Takumi craftsmanship blended with bold design.",
        models: &[SeedModel {
            name: "LC 500",
            car_type: CarType::GrandTourer,
            year: 2023,
            price_cents: 10_200_000,
            description: "Naturally aspirated V8 grand tourer with concept-car looks.",
            image_url: "https://images.unsplash.com/photo-1502877338535-766e1452684a",
        }],
    },
    SeedMake {
        name: "Alfa Romeo",
        description: "Italian performance sedans with motorsport heritage.",
        models: &[SeedModel {
            name: "Giulia Quadrifoglio",
            car_type: CarType::Sedan,
            year: 2024,
            price_cents: 8_100_000,
            description: "Ferrari-derived twin-turbo V6 with daily practicality.",
            image_url: "https://images.unsplash.com/photo-1523986371872-9d3ba2e2f642",
        }],
    },
    SeedMake {
        name: "Cadillac",
        description: "American luxury reimagined with V-Series performance.",
        models: &[SeedModel {
            name: "Escalade V",
            car_type: CarType::Suv,
            year: 2023,
            price_cents: 14_900_000,
            description: "Supercharged V8 full-size SUV with commanding presence.",
            image_url: UNSPLASH_DEFAULT,
        }],
    },
    SeedMake {
        name: "Tesla",
        description: "Industry-leading electric innovation.",
        models: &[SeedModel {
            name: "Model S Plaid",
            car_type: CarType::Sedan,
            year: 2023,
            price_cents: 13_599_000,
            description: "Tri-motor electric sedan with incredible acceleration.",
            image_url: UNSPLASH_DEFAULT,
        }],
    },
    SeedMake {
        name: "Nissan",
        description: "High-tech Japanese performance icons.",
        models: &[SeedModel {
            name: "GT-R Nismo",
            car_type: CarType::Sport,
            year: 2022,
            price_cents: 21_500_000,
            description: "All-wheel-drive supercar tuned by NISMO engineers.",
            image_url: "https://images.unsplash.com/photo-1512495968721-52d4a3d1c951",
        }],
    },
];

/// Number of cars in the sample catalogue.
pub fn sample_car_count() -> usize {
    SAMPLE_CATALOGUE.iter().map(|make| make.models.len()).sum()
}

/// Load the sample catalogue with get-or-create semantics.
///
/// Re-running it, or running it concurrently, leaves exactly one copy of
/// every make and car. Returns the number of cars processed.
pub async fn seed_catalogue<R>(repo: &R) -> ServiceResult<usize>
where
    R: CatalogueRepository + ?Sized,
{
    let mut processed = 0;
    for entry in SAMPLE_CATALOGUE {
        let make = repo
            .get_or_create_make(&NewCarMake {
                name: entry.name.to_string(),
                description: entry.description.to_string(),
            })
            .await?;

        for model in entry.models {
            let car = NewCar {
                make_id: make.id,
                name: model.name.to_string(),
                description: model.description.to_string(),
                car_type: model.car_type,
                year: model.year,
                price: Decimal::new(model.price_cents, 2),
                image_url: model.image_url.to_string(),
            };
            car.validate().map_err(ServiceError::Validation)?;
            repo.get_or_create_car(&car).await?;
            processed += 1;
        }
    }
    Ok(processed)
}

/// Seed the catalogue when it holds no cars.
///
/// `checked` short-circuits the row count once this process has seen a
/// populated catalogue. Returns whether seeding ran.
pub async fn ensure_catalogue<R>(repo: &R, checked: &AtomicBool) -> ServiceResult<bool>
where
    R: CatalogueRepository + ?Sized,
{
    if checked.load(Ordering::Acquire) {
        return Ok(false);
    }

    let seeded = if repo.count_cars().await? == 0 {
        let cars = seed_catalogue(repo).await?;
        log::info!("Seeded empty catalogue with {} cars", cars);
        true
    } else {
        false
    };

    checked.store(true, Ordering::Release);
    Ok(seeded)
}
