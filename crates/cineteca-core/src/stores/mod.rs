pub mod memory;

pub use memory::MemoryFavoritesStore;
