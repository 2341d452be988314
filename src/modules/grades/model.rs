pub use registra_models::grades::{ProcessScoreItem, ProcessScoreReport, UpsertProcessScoresDto};
