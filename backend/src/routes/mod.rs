pub mod accounts;
pub mod cars;
pub mod comments;
pub mod dealers;
pub mod engagement;
pub mod profile;
