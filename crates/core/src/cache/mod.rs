mod policy;
mod traits;

pub use policy::{
    retained_after_eviction, EvictionPolicy, DEFAULT_MAX_COUNT, RETAINED_FRACTION,
};
pub use traits::Cache;
