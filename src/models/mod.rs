// Models module - Database entity representations

pub mod card;
pub mod user;

pub use card::{Card, CardType, CardView};
pub use user::User;
