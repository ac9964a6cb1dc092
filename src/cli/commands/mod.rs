pub(crate) mod estimate;
pub(crate) use estimate::Estimate;

pub(crate) mod gas_prices;
pub(crate) use gas_prices::GasPrices;
