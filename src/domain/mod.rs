// Correlation results and report vocabulary
pub mod correlation;

// Domain-specific error types
pub mod errors;

// Price bars, news items and the trading calendar
pub mod market;

// Sentiment categories and daily aggregates
pub mod sentiment;

// Shared statistics
pub mod statistics;

// Input data quality
pub mod validation;
