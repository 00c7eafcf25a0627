// Timestamp -> calendar date in the reference timezone
pub mod time_normalizer;

// Close-to-close returns per ticker
pub mod return_calculator;

// News -> trading day mapping and the sentiment/return join
pub mod aligner;

pub mod sentiment_aggregator;

// Per-ticker statistics and cross-ticker summary
pub mod correlation_engine;

// One batch run end to end
pub mod pipeline;
