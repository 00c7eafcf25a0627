// Trading calendar derived from price data
pub mod trading_calendar;

// Input and joined record types
pub mod types;
