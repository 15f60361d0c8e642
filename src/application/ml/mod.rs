pub mod horizon;
pub mod random_forest_forecaster;
pub mod seasonality;
pub mod trend_forecaster;

pub use horizon::MIN_OBSERVATIONS;
pub use random_forest_forecaster::{
    RandomForestConfig, RandomForestForecaster, RandomForestModel,
};
pub use seasonality::{SeasonalTerm, SeasonalityMode};
pub use trend_forecaster::{ForecastConfig, TrendModel, TrendSeasonalityForecaster};
