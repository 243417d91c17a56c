pub mod analysis;
pub mod config;
pub mod error;
pub mod input;
pub mod normalize;
pub mod report;
pub mod weather;

pub use analysis::{AnalysisType, CompareRoute, InputKind};
pub use config::{ClientConfig, load_config};
pub use error::{ConfigError, ResponseError, ValidationError};
pub use input::{FileAllowList, PolicyPair, UploadFile};
pub use normalize::{AnalysisOutcome, RawResponse, error_detail, normalize};
pub use report::{
    AnalysisReport, Comparison, ComparisonDetails, ComparisonReport, Document, DocumentResponse,
    Entity, EntityReport, RecommendationResponse, SimilarDay, Statistics, SummaryReport,
    WeatherQuery,
};
pub use weather::{WeatherField, WeatherForm};
