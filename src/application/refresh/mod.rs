pub mod refresh_loop;
pub mod report;

pub use refresh_loop::{RefreshCanceller, RefreshHandle, RefreshLoop};
pub use report::{
    CycleReport, NewsOutcome, PipelineStage, ScoredHeadline, SymbolFailure, SymbolOutcome,
    SymbolReport,
};
