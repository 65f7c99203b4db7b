/// Configuration default values
///
/// All defaults live here so they can be changed in one place.
// Catalog defaults
pub const DEFAULT_API_BASE_URL: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_SPRITE_BASE_URL: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon";
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_PREFETCH_THRESHOLD: usize = 5;
pub const DEFAULT_REQUEST_TIMEOUT: &str = "15s";
pub const DEFAULT_CONNECT_TIMEOUT: &str = "10s";

// Search defaults
pub const DEFAULT_SEARCH_DEBOUNCE: &str = "250ms";

// Color pipeline defaults
pub const DEFAULT_MAX_CONCURRENT_EXTRACTIONS: usize = 4;

// Event channel capacity for collection events
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;
