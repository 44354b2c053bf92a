mod error;
mod keys;
mod serialization;
mod traits;

pub use error::{CacheError, Result};
pub use keys::{
    entity_key, event_channel, extract_prefix_from_key, is_list_key, list_key, list_prefix,
    tracking_key,
};
pub use serialization::{deserialize, serialize, SerializationError};
pub use traits::Cache;
