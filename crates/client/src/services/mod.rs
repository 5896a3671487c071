//! Client services.
//!
//! Each service wraps one area of the backend and writes its results into
//! the shared [`Store`](crate::store::Store).

pub mod carts;
pub mod categories;
pub mod users;

pub use carts::CartService;
pub use categories::CategoryService;
pub use users::UserService;
