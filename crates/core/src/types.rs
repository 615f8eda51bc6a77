/// All entity primary keys.
pub type DbId = i64;

/// Calendar dates carry no time-of-day; comparisons happen at midnight.
pub type Date = chrono::NaiveDate;

/// Currency amounts in AUD, kept exact until presentation.
pub type Money = rust_decimal::Decimal;
