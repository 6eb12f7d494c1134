use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Int4, Int8, Numeric, Text, Timestamptz};
use rust_decimal::Decimal;

use super::schema::{car_makes, cars, comment_likes, comments, favorites, sessions, users};
use crate::api::{CarId, CarMakeId, CommentId, UserId};
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::models::{
    Car, CarListing, CarMake, CarType, Comment, CommentAuthorRecord, CommentLike, Favorite,
    Session, User,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = car_makes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CarMakeRow {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl From<CarMakeRow> for CarMake {
    fn from(row: CarMakeRow) -> Self {
        CarMake {
            id: CarMakeId::new(row.id),
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = car_makes)]
pub struct NewCarMakeRow<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = cars)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CarRow {
    pub id: i64,
    pub make_id: i64,
    pub name: String,
    pub description: String,
    pub car_type: String,
    pub year: i32,
    pub price: Decimal,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CarRow> for Car {
    type Error = RepositoryError;

    fn try_from(row: CarRow) -> RepositoryResult<Self> {
        let car_type = row
            .car_type
            .parse::<CarType>()
            .map_err(RepositoryError::internal)?;
        Ok(Car {
            id: CarId::new(row.id),
            make_id: CarMakeId::new(row.make_id),
            name: row.name,
            description: row.description,
            car_type,
            year: row.year,
            price: row.price,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = cars)]
pub struct NewCarRow<'a> {
    pub make_id: i64,
    pub name: &'a str,
    pub description: &'a str,
    pub car_type: &'a str,
    pub year: i32,
    pub price: Decimal,
    pub image_url: &'a str,
}

/// One row of the catalogue listing query: car, make name and both counts.
#[derive(Debug, Clone, QueryableByName)]
pub struct CarListingRow {
    #[diesel(sql_type = Int8)]
    pub id: i64,
    #[diesel(sql_type = Int8)]
    pub make_id: i64,
    #[diesel(sql_type = Text)]
    pub name: String,
    #[diesel(sql_type = Text)]
    pub description: String,
    #[diesel(sql_type = Text)]
    pub car_type: String,
    #[diesel(sql_type = Int4)]
    pub year: i32,
    #[diesel(sql_type = Numeric)]
    pub price: Decimal,
    #[diesel(sql_type = Text)]
    pub image_url: String,
    #[diesel(sql_type = Timestamptz)]
    pub created_at: DateTime<Utc>,
    #[diesel(sql_type = Timestamptz)]
    pub updated_at: DateTime<Utc>,
    #[diesel(sql_type = Text)]
    pub make_name: String,
    #[diesel(sql_type = BigInt)]
    pub favorite_count: i64,
    #[diesel(sql_type = BigInt)]
    pub comment_count: i64,
}

impl TryFrom<CarListingRow> for CarListing {
    type Error = RepositoryError;

    fn try_from(row: CarListingRow) -> RepositoryResult<Self> {
        let car = Car::try_from(CarRow {
            id: row.id,
            make_id: row.make_id,
            name: row.name,
            description: row.description,
            car_type: row.car_type,
            year: row.year,
            price: row.price,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })?;
        Ok(CarListing {
            car,
            make_name: row.make_name,
            favorite_count: row.favorite_count,
            comment_count: row.comment_count,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::new(row.id),
            username: row.username,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            is_staff: row.is_staff,
            date_joined: row.date_joined,
        }
    }
}

impl From<UserRow> for CommentAuthorRecord {
    fn from(row: UserRow) -> Self {
        CommentAuthorRecord {
            id: UserId::new(row.id),
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub is_staff: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SessionRow {
    pub token: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            token: row.token,
            user_id: UserId::new(row.user_id),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = favorites)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FavoriteRow {
    pub id: i64,
    pub user_id: i64,
    pub car_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<FavoriteRow> for Favorite {
    fn from(row: FavoriteRow) -> Self {
        Favorite {
            id: row.id,
            user_id: UserId::new(row.user_id),
            car_id: CarId::new(row.car_id),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CommentRow {
    pub id: i64,
    pub car_id: i64,
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: CommentId::new(row.id),
            car_id: CarId::new(row.car_id),
            user_id: UserId::new(row.user_id),
            parent_id: row.parent_id.map(CommentId::new),
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comments)]
pub struct NewCommentRow<'a> {
    pub car_id: i64,
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub content: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = comment_likes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CommentLikeRow {
    pub id: i64,
    pub user_id: i64,
    pub comment_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<CommentLikeRow> for CommentLike {
    fn from(row: CommentLikeRow) -> Self {
        CommentLike {
            id: row.id,
            user_id: UserId::new(row.user_id),
            comment_id: CommentId::new(row.comment_id),
            created_at: row.created_at,
        }
    }
}
