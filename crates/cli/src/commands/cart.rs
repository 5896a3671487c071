//! Cart commands.
//!
//! Every command starts from the server's current cart, so the local cache
//! always reflects the backend after a run.

use shopfront_client::Shopfront;
use shopfront_core::{Cart, CartItemId, ProductId, SessionToken};

use super::{CliError, print_json};

/// Print the current cart.
pub async fn show(shopfront: &Shopfront, token: &SessionToken) -> Result<(), CliError> {
    match shopfront.carts().fetch_cart_details(token).await? {
        Some(cart) => print_json(&cart),
        None => {
            println!("No open cart");
            Ok(())
        }
    }
}

/// Open a new cart.
pub async fn create(shopfront: &Shopfront, token: &SessionToken) -> Result<(), CliError> {
    let cart = shopfront.carts().create_cart(token).await?;
    print_json(&cart)
}

/// Close (check out) the current cart.
pub async fn close(shopfront: &Shopfront, token: &SessionToken) -> Result<(), CliError> {
    let cart = current(shopfront, token).await?;
    let response = shopfront.carts().close_cart(&cart.id, token).await?;
    print_json(&response)
}

/// List the items of the current cart.
pub async fn items(shopfront: &Shopfront, token: &SessionToken) -> Result<(), CliError> {
    let cart = current(shopfront, token).await?;
    let items = shopfront
        .carts()
        .fetch_cart_items_by_cart_id(&cart.id, token)
        .await?;
    print_json(&items)
}

/// Add a product to the current cart.
pub async fn add(
    shopfront: &Shopfront,
    token: &SessionToken,
    product: &ProductId,
    quantity: u32,
) -> Result<(), CliError> {
    let cart = current(shopfront, token).await?;
    shopfront
        .carts()
        .fetch_cart_items_by_cart_id(&cart.id, token)
        .await?;
    let item = shopfront
        .carts()
        .add_cart_item(&cart.id, product, quantity, token)
        .await?;
    print_json(&item)
}

/// Remove one item.
pub async fn remove(
    shopfront: &Shopfront,
    token: &SessionToken,
    item_id: &CartItemId,
) -> Result<(), CliError> {
    if let Some(cart) = shopfront.carts().fetch_cart_details(token).await? {
        shopfront
            .carts()
            .fetch_cart_items_by_cart_id(&cart.id, token)
            .await?;
    }
    shopfront.carts().delete_cart_item(item_id, token).await?;
    println!("Removed {item_id}");
    Ok(())
}

/// Remove every item of the current cart.
pub async fn empty(shopfront: &Shopfront, token: &SessionToken) -> Result<(), CliError> {
    let cart = current(shopfront, token).await?;
    shopfront
        .carts()
        .empty_cart_items_by_cart_id(&cart.id, token)
        .await?;
    println!("Emptied cart {}", cart.id);
    Ok(())
}

async fn current(shopfront: &Shopfront, token: &SessionToken) -> Result<Cart, CliError> {
    shopfront
        .carts()
        .fetch_cart_details(token)
        .await?
        .ok_or(CliError::NoCart)
}
