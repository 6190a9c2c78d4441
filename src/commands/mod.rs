pub mod list_symbols;
pub mod sync_prices;
