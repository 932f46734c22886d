mod setups;

pub use storefront_world::StorefrontWorld;
