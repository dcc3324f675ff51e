//! Backend proxy that asks an external language model whether a web page looks like
//! a scam or phishing site, and normalizes every answer into a fixed result shape.

pub mod analysis;
pub mod config;
pub mod content;
pub mod error;
pub mod history;
pub mod introspection;
pub mod normalize;
pub mod prompt;
pub mod provider;
pub mod relay;
pub mod risk;
pub mod routes;
pub mod secrets;
pub mod startup;
pub mod state;
pub mod status;

pub use analysis::{AnalysisResult, ScanResult};
pub use content::{AnalyzeRequest, WebsiteContent};
pub use risk::RiskLevel;
