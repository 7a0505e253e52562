pub mod feature_metadata;
pub mod feature_row;
pub mod model_metadata;
pub mod raw_interaction;
pub mod raw_product;
