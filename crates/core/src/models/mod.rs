//! Records exchanged with the backend and mirrored into client state.

pub mod cart;
pub mod category;
pub mod user;

pub use cart::{AddCartItem, Cart, CartItem};
pub use category::Category;
pub use user::{LoginCredentials, NewUser, UserDetails};
