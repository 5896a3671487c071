//! Reference data: cities and categories.

use shopfront_client::Shopfront;
use shopfront_core::SessionToken;

use super::CliError;

/// Print the cities offered at registration, one per line.
pub async fn cities(shopfront: &Shopfront) -> Result<(), CliError> {
    for city in shopfront.users().fetch_cities().await? {
        println!("{city}");
    }
    Ok(())
}

/// Print the product categories as `id<TAB>name`.
pub async fn categories(shopfront: &Shopfront, token: &SessionToken) -> Result<(), CliError> {
    for category in shopfront.categories().fetch_categories(token).await? {
        println!("{}\t{}", category.id, category.name);
    }
    Ok(())
}
