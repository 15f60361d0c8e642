use crate::domain::errors::PipelineError;
use crate::domain::forecast::Forecast;
use crate::domain::indicators::IndicatorSet;
use crate::domain::market::CandleSeries;
use crate::domain::news::NewsItem;
use crate::domain::sentiment::SentimentLabel;
use chrono::{DateTime, Utc};
use std::fmt;

/// Per-symbol step that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    FetchSeries,
    Forecast,
    FetchPrice,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchSeries => write!(f, "fetch_series"),
            Self::Forecast => write!(f, "forecast"),
            Self::FetchPrice => write!(f, "fetch_price"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SymbolReport {
    pub symbol: String,
    pub series: CandleSeries,
    pub indicators: IndicatorSet,
    pub forecast: Forecast,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolFailure {
    pub symbol: String,
    pub stage: PipelineStage,
    pub error: PipelineError,
    pub attempts: u32,
}

#[derive(Debug, Clone)]
pub enum SymbolOutcome {
    Completed(Box<SymbolReport>),
    Failed(SymbolFailure),
}

impl SymbolOutcome {
    pub fn symbol(&self) -> &str {
        match self {
            Self::Completed(report) => &report.symbol,
            Self::Failed(failure) => &failure.symbol,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredHeadline {
    pub item: NewsItem,
    pub sentiment: SentimentLabel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NewsOutcome {
    Headline(ScoredHeadline),
    /// Feed answered with zero items.
    Empty,
    Failed(PipelineError),
    /// No feed configured.
    Disabled,
    /// Cycle was cancelled before the news step.
    Skipped,
}

/// Everything one pass over the symbol set produced.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<SymbolOutcome>,
    pub news: NewsOutcome,
    /// Cancellation arrived mid-cycle; `outcomes` covers only the symbols reached.
    pub interrupted: bool,
}

impl CycleReport {
    pub fn successes(&self) -> impl Iterator<Item = &SymbolReport> {
        self.outcomes.iter().filter_map(|o| match o {
            SymbolOutcome::Completed(report) => Some(report.as_ref()),
            SymbolOutcome::Failed(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &SymbolFailure> {
        self.outcomes.iter().filter_map(|o| match o {
            SymbolOutcome::Failed(failure) => Some(failure),
            SymbolOutcome::Completed(_) => None,
        })
    }

    pub fn outcome_for(&self, symbol: &str) -> Option<&SymbolOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.symbol().eq_ignore_ascii_case(symbol))
    }

    pub fn headline(&self) -> Option<&ScoredHeadline> {
        match &self.news {
            NewsOutcome::Headline(h) => Some(h),
            _ => None,
        }
    }
}
