//! GraphQL documents sent to the Admin API.
//!
//! Field selections are shared through string fragments so the product and
//! order shapes in [`super::types`] stay in one place.

/// Product fields selected by every product query and mutation.
macro_rules! product_fields {
    () => {
        r"
    id
    title
    description
    productType
    status
    images(first: 10) {
      edges { node { id url altText } }
    }
    variants(first: 50) {
      edges { node { id title sku price inventoryQuantity } }
    }
"
    };
}

/// Order fields selected by every order query and mutation.
macro_rules! order_fields {
    () => {
        r"
    id
    name
    email
    createdAt
    updatedAt
    tags
    displayFinancialStatus
    displayFulfillmentStatus
    subtotalPriceSet { shopMoney { amount currencyCode } }
    totalShippingPriceSet { shopMoney { amount currencyCode } }
    totalTaxSet { shopMoney { amount currencyCode } }
    totalPriceSet { shopMoney { amount currencyCode } }
    customer { id email }
    shippingAddress { name address1 address2 city province zip country phone }
    lineItems(first: 50) {
      edges {
        node {
          id
          title
          quantity
          originalUnitPriceSet { shopMoney { amount currencyCode } }
          variant { id product { id } }
        }
      }
    }
"
    };
}

pub const PRODUCTS: &str = concat!(
    "query Products($first: Int!, $query: String) {\n",
    "  products(first: $first, query: $query, sortKey: CREATED_AT, reverse: true) {\n",
    "    edges { cursor node {",
    product_fields!(),
    "    } }\n",
    "    pageInfo { hasNextPage endCursor }\n",
    "  }\n",
    "}\n",
);

pub const PRODUCT: &str = concat!(
    "query Product($id: ID!) {\n",
    "  product(id: $id) {",
    product_fields!(),
    "  }\n",
    "}\n",
);

pub const PRODUCT_CREATE: &str = concat!(
    "mutation ProductCreate($input: ProductInput!) {\n",
    "  productCreate(input: $input) {\n",
    "    product {",
    product_fields!(),
    "    }\n",
    "    userErrors { field message }\n",
    "  }\n",
    "}\n",
);

pub const PRODUCT_UPDATE: &str = concat!(
    "mutation ProductUpdate($input: ProductInput!) {\n",
    "  productUpdate(input: $input) {\n",
    "    product {",
    product_fields!(),
    "    }\n",
    "    userErrors { field message }\n",
    "  }\n",
    "}\n",
);

/// Sets the price of a product's first variant.
pub const VARIANT_PRICE_UPDATE: &str = r"
mutation VariantPriceUpdate($productId: ID!, $variants: [ProductVariantsBulkInput!]!) {
  productVariantsBulkUpdate(productId: $productId, variants: $variants) {
    productVariants { id price }
    userErrors { field message }
  }
}
";

pub const PRODUCT_DELETE: &str = r"
mutation ProductDelete($input: ProductDeleteInput!) {
  productDelete(input: $input) {
    deletedProductId
    userErrors { field message }
  }
}
";

pub const ORDERS: &str = concat!(
    "query Orders($first: Int!, $query: String) {\n",
    "  orders(first: $first, query: $query, sortKey: CREATED_AT, reverse: true) {\n",
    "    edges { cursor node {",
    order_fields!(),
    "    } }\n",
    "    pageInfo { hasNextPage endCursor }\n",
    "  }\n",
    "}\n",
);

pub const ORDER: &str = concat!(
    "query Order($id: ID!) {\n",
    "  order(id: $id) {",
    order_fields!(),
    "  }\n",
    "}\n",
);

/// Reads only the tags of an order, for read-modify-write tag updates.
pub const ORDER_TAGS: &str = r"
query OrderTags($id: ID!) {
  order(id: $id) { id tags }
}
";

pub const ORDER_UPDATE: &str = concat!(
    "mutation OrderUpdate($input: OrderInput!) {\n",
    "  orderUpdate(input: $input) {\n",
    "    order {",
    order_fields!(),
    "    }\n",
    "    userErrors { field message }\n",
    "  }\n",
    "}\n",
);

pub const ORDER_DELETE: &str = r"
mutation OrderDelete($orderId: ID!) {
  orderDelete(orderId: $orderId) {
    deletedId
    userErrors { field message }
  }
}
";

pub const DRAFT_ORDER_CREATE: &str = r"
mutation DraftOrderCreate($input: DraftOrderInput!) {
  draftOrderCreate(input: $input) {
    draftOrder { id }
    userErrors { field message }
  }
}
";

pub const DRAFT_ORDER_COMPLETE: &str = concat!(
    "mutation DraftOrderComplete($id: ID!) {\n",
    "  draftOrderComplete(id: $id, paymentPending: true) {\n",
    "    draftOrder {\n",
    "      id\n",
    "      order {",
    order_fields!(),
    "      }\n",
    "    }\n",
    "    userErrors { field message }\n",
    "  }\n",
    "}\n",
);
