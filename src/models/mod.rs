pub mod category;
pub mod event;
pub mod location;
pub mod user;

pub use category::Category;
pub use event::{Event, EventSession, EventStatus, EventTicket};
pub use location::{City, Country};
pub use user::{Role, User};
