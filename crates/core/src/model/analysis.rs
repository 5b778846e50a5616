use serde::{Deserialize, Serialize};

/// A named principle drawn from the chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principle {
    pub label: String,
    pub description: String,
}

/// One step of the five-step marketing framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkStep {
    pub step: u8,
    pub title: String,
    pub description: String,
}

/// How the chapter applies to the brand being studied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandApplication {
    /// Smallest viable market.
    pub svm: String,
    pub change_story: String,
    pub culture: String,
    pub xy_statement: String,
}

/// Chapter analysis for a single analyzed week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyAnalysis {
    pub core_message: String,
    pub principles: Vec<Principle>,
    pub framework: [FrameworkStep; 5],
    pub brand_application: Option<BrandApplication>,
}

/// A single market trend observed for the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trend {
    pub name: String,
    pub description: String,
}

/// Market research attached to an analyzed week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendReport {
    pub market_size: String,
    pub market_share: String,
    pub key_trends: Vec<Trend>,
    pub threats: Vec<String>,
}

impl WeeklyAnalysis {
    /// Framework steps are numbered 1 through 5 in order.
    #[must_use]
    pub fn framework_is_sequential(&self) -> bool {
        self.framework
            .iter()
            .zip(1u8..)
            .all(|(step, expected)| step.step == expected)
    }
}
