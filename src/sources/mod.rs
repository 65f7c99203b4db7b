//! Remote catalog sources
//!
//! - `traits`: the `CatalogSource` contract consumed by the paging engine
//! - `pokeapi`: HTTP implementation against the PokeAPI

pub mod pokeapi;
pub mod traits;

pub use pokeapi::PokeApiSource;
pub use traits::CatalogSource;

#[cfg(test)]
pub use traits::MockCatalogSource;
