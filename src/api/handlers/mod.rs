pub mod articles;
pub mod comments;
pub mod health;
pub mod principal;
pub mod profiles;
pub mod users;

pub use principal::Principal;
