//! Newsdigest Core: article and enrichment data model shared by the
//! inference client, the news feed client and the CLI.

pub mod model;


pub use model::{
    Article, ArticleOutcome, EnrichmentResult, InferenceRequest, OutcomeStatus, Parameters,
    Sentiment, Task,
};
