use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

pub const MIN_ANALYSIS_TEXT_LENGTH: usize = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeContentModel {
    pub id: Option<String>,
    pub text: Option<String>,
}

/// One scored section of an analysis. Provider extras such as `keywords`,
/// `gradeLevel` or `tone` are kept in `extra` and persisted untouched; `score`
/// stays a JSON number so `85` is not rewritten as `85.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSection {
    pub score: Number,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResults {
    pub seo: AnalysisSection,
    pub readability: AnalysisSection,
    pub engagement: AnalysisSection,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeContentDto {
    pub success: bool,
    pub analysis: AnalysisResults,
}
