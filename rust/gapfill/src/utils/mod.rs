pub mod tuple_range;
pub use tuple_range::{
    binary_search_range_by_key,
    TupleRange,
    TupleRangeError,
};
