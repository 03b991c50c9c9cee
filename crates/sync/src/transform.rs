//! Local product → platform schema transformation.
//!
//! Pure functions so the mapping rules stay unit-testable: status
//! mapping (`active` → ACTIVE, everything else DRAFT), comma-joined
//! tags, and a single default variant carrying price/inventory/sku/
//! weight, gated by the connection's feature flags.

use catsync_core::platform::ConnectionConfig;
use catsync_db::models::product::Product;
use catsync_shopify::graphql::{
    CreateMediaInput, InventoryQuantityInput, ProductInput, VariantInput,
};

/// Remote status for locally active products.
const STATUS_ACTIVE: &str = "ACTIVE";
/// Remote status for everything else (draft, archived, unknown).
const STATUS_DRAFT: &str = "DRAFT";

/// Map a local product status onto the platform's enum.
pub fn map_status(local: &str) -> &'static str {
    if local.eq_ignore_ascii_case("active") {
        STATUS_ACTIVE
    } else {
        STATUS_DRAFT
    }
}

/// Build the `ProductInput` for a create or update mutation.
///
/// `external_id` is set for updates and absent for creates. Price
/// honors the connection's `sync_prices` flag; images are handled
/// separately by the staged uploader. Inventory is pushed against
/// `inventory_location` when `sync_inventory` is on; without a resolved
/// location the quantity is omitted.
pub fn to_product_input(
    product: &Product,
    config: &ConnectionConfig,
    external_id: Option<&str>,
    inventory_location: Option<&str>,
) -> ProductInput {
    let tags = if product.tags.is_empty() {
        None
    } else {
        Some(product.tags.join(","))
    };

    let inventory_quantities = match (config.sync_inventory, inventory_location) {
        (true, Some(location_id)) => Some(vec![InventoryQuantityInput {
            available_quantity: product.inventory_count,
            location_id: location_id.to_string(),
        }]),
        _ => None,
    };

    let variant = VariantInput {
        price: if config.sync_prices {
            product.price.clone()
        } else {
            None
        },
        sku: product.sku.clone(),
        inventory_quantities,
        weight: product.weight_grams.map(|g| g as f64),
        weight_unit: product.weight_grams.map(|_| "GRAMS".to_string()),
    };

    ProductInput {
        id: external_id.map(String::from),
        title: product.title.clone(),
        description_html: product.description.clone(),
        vendor: product.vendor.clone(),
        product_type: product.product_type.clone(),
        tags,
        status: map_status(&product.status).to_string(),
        variants: vec![variant],
    }
}

/// Wrap staged resource URLs as media inputs for the mutation.
pub fn to_media_inputs(resource_urls: &[String]) -> Vec<CreateMediaInput> {
    resource_urls
        .iter()
        .map(|url| CreateMediaInput {
            original_source: url.clone(),
            media_content_type: "IMAGE".to_string(),
        })
        .collect()
}

/// Which image URLs should be staged for this product, honoring the
/// connection's `sync_images` flag.
pub fn image_urls_to_sync<'a>(product: &'a Product, config: &ConnectionConfig) -> &'a [String] {
    if config.sync_images {
        &product.image_urls
    } else {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product() -> Product {
        Product {
            id: 1,
            title: "Ceramic Mug".into(),
            description: Some("<p>A mug</p>".into()),
            vendor: Some("Acme".into()),
            product_type: Some("Kitchen".into()),
            tags: vec!["kitchen".into(), "ceramic".into()],
            status: "active".into(),
            price: Some("12.50".into()),
            sku: Some("MUG-1".into()),
            inventory_count: 7,
            weight_grams: Some(300),
            image_urls: vec!["https://cdn/a.png".into()],
            external_source: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(map_status("active"), "ACTIVE");
        assert_eq!(map_status("Active"), "ACTIVE");
        assert_eq!(map_status("draft"), "DRAFT");
        assert_eq!(map_status("archived"), "DRAFT");
        assert_eq!(map_status(""), "DRAFT");
    }

    const LOCATION: &str = "gid://shopify/Location/1";

    #[test]
    fn test_full_transform() {
        let input = to_product_input(&product(), &ConnectionConfig::default(), None, Some(LOCATION));
        assert_eq!(input.title, "Ceramic Mug");
        assert_eq!(input.tags.as_deref(), Some("kitchen,ceramic"));
        assert_eq!(input.status, "ACTIVE");
        assert!(input.id.is_none());
        let variant = &input.variants[0];
        assert_eq!(variant.price.as_deref(), Some("12.50"));
        assert_eq!(variant.sku.as_deref(), Some("MUG-1"));
        assert_eq!(variant.weight, Some(300.0));
        assert_eq!(variant.weight_unit.as_deref(), Some("GRAMS"));
    }

    #[test]
    fn test_update_carries_external_id() {
        let input = to_product_input(
            &product(),
            &ConnectionConfig::default(),
            Some("gid://shopify/Product/9"),
            None,
        );
        assert_eq!(input.id.as_deref(), Some("gid://shopify/Product/9"));
    }

    #[test]
    fn test_price_flag_off_omits_price() {
        let config = ConnectionConfig {
            sync_prices: false,
            ..Default::default()
        };
        let input = to_product_input(&product(), &config, None, None);
        assert!(input.variants[0].price.is_none());
    }

    #[test]
    fn test_inventory_pushed_to_location() {
        let input = to_product_input(&product(), &ConnectionConfig::default(), None, Some(LOCATION));
        let quantities = input.variants[0].inventory_quantities.as_ref().unwrap();
        assert_eq!(quantities.len(), 1);
        assert_eq!(quantities[0].available_quantity, 7);
        assert_eq!(quantities[0].location_id, LOCATION);

        // The wire shape must use the platform's field names.
        let json = serde_json::to_value(&input.variants[0]).unwrap();
        assert_eq!(json["inventoryQuantities"][0]["availableQuantity"], 7);
        assert_eq!(json["inventoryQuantities"][0]["locationId"], LOCATION);
    }

    #[test]
    fn test_inventory_flag_off_omits_quantities() {
        let config = ConnectionConfig {
            sync_inventory: false,
            ..Default::default()
        };
        let input = to_product_input(&product(), &config, None, Some(LOCATION));
        assert!(input.variants[0].inventory_quantities.is_none());

        let json = serde_json::to_value(&input.variants[0]).unwrap();
        assert!(json.get("inventoryQuantities").is_none());
    }

    #[test]
    fn test_inventory_without_location_omits_quantities() {
        let input = to_product_input(&product(), &ConnectionConfig::default(), None, None);
        assert!(input.variants[0].inventory_quantities.is_none());
    }

    #[test]
    fn test_image_flag_off_skips_staging() {
        let config = ConnectionConfig {
            sync_images: false,
            ..Default::default()
        };
        assert!(image_urls_to_sync(&product(), &config).is_empty());
        assert_eq!(
            image_urls_to_sync(&product(), &ConnectionConfig::default()).len(),
            1
        );
    }

    #[test]
    fn test_empty_tags_omitted() {
        let mut p = product();
        p.tags.clear();
        let input = to_product_input(&p, &ConnectionConfig::default(), None, None);
        assert!(input.tags.is_none());
    }
}
