use cljscope_analyzer::AnalyzerError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Function \"{name}\" not found")]
    FunctionNotFound { name: String, available: Vec<String> },

    #[error("Namespace \"{name}\" not found")]
    NamespaceNotFound { name: String, available: Vec<String> },

    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
}

impl GraphError {
    /// Names that were discovered, for not-found errors
    pub fn available(&self) -> &[String] {
        match self {
            Self::FunctionNotFound { available, .. } | Self::NamespaceNotFound { available, .. } => {
                available
            }
            Self::Analyzer(_) => &[],
        }
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::FunctionNotFound { .. } | Self::NamespaceNotFound { .. }
        )
    }
}
