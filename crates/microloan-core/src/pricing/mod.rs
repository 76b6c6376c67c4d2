pub mod engine;
pub mod policy;

pub use engine::{compare_models, compute_quote, price_quote, ModelComparison, PriceQuoteInput};
pub use policy::{FeeClamp, FeePolicy, InterestModel, PricingPolicy};
