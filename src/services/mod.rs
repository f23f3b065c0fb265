pub mod categories;
pub mod events;
pub mod locations;
pub mod sessions;
pub mod ticket;
pub mod users;
