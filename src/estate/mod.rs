//! Estate value on death and inheritance tax

mod aggregate;
mod iht;

pub use aggregate::{
    iht_item_value, is_iht_asset, nil_rate_band, summarise_estate, EstateAdjustments,
    EstateSummary, EstateToggles, STANDARD_NIL_RATE_BAND,
};
pub use iht::{
    calculate_iht, EstateInputs, EstateOutputs, CHARITY_THRESHOLD, IHT_RATE, REDUCED_IHT_RATE,
};
