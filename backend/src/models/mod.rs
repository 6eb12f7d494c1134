pub mod account;
pub mod catalogue;
pub mod comment;
pub mod engagement;

pub use account::*;
pub use catalogue::*;
pub use comment::*;
pub use engagement::*;
