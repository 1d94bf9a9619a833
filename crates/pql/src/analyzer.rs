//! The analysis entry point

use log::debug;
use pql_ast::{NodeMeta, Statement};
use pql_diagnostics::{Diagnostic, Result};
use pql_normalize::{NormalizationPipeline, SanityValidator};
use pql_types::{
    FunctionRegistry, InferenceOptions, Problem, StaticType, StaticTypeInferencer, TypeAnnotations,
};

use crate::SemanticOptions;

/// Overall verdict of an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStatus {
    /// No problem is an error; warnings may remain
    Success,
    /// At least one problem is an error
    Failure,
}

impl AnalysisStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Result of analyzing a statement
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// The normalized statement
    pub statement: Statement,
    /// Metadata written by normalization
    pub meta: NodeMeta,
    /// Per-node types and scope qualifiers
    pub annotations: TypeAnnotations,
    /// Type of the whole statement, best effort when there are errors
    pub result_type: StaticType,
    /// Problems in discovery order
    pub problems: Vec<Problem>,
}

impl AnalysisOutcome {
    pub fn status(&self) -> AnalysisStatus {
        if self.problems.iter().any(Problem::is_error) {
            AnalysisStatus::Failure
        } else {
            AnalysisStatus::Success
        }
    }

    /// Problems that are errors
    pub fn errors(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter().filter(|p| p.is_error())
    }

    /// Problems that are warnings
    pub fn warnings(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter().filter(|p| !p.is_error())
    }

    /// Problems rendered for display
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.problems.iter().map(Problem::to_diagnostic).collect()
    }
}

/// Validates, normalizes and type checks statements
///
/// The analyzer holds no per-statement state and can be reused.
#[derive(Debug)]
pub struct StaticAnalyzer {
    options: SemanticOptions,
    functions: FunctionRegistry,
    inference: InferenceOptions,
    pipeline: NormalizationPipeline,
}

impl StaticAnalyzer {
    pub fn new(options: SemanticOptions) -> Self {
        Self {
            functions: options.function_registry(),
            inference: options.inference_options(),
            pipeline: NormalizationPipeline::new(),
            options,
        }
    }

    pub fn options(&self) -> &SemanticOptions {
        &self.options
    }

    /// Analyze a statement
    ///
    /// Structural violations and scope errors end the run with an error.
    /// Type checking problems are returned in the outcome.
    pub fn analyze(&self, statement: Statement) -> Result<AnalysisOutcome> {
        debug!("analyzing {statement}");
        SanityValidator.validate(&statement)?;

        let mut meta = NodeMeta::new();
        let statement = self.pipeline.run(statement, &mut meta)?;
        debug!("normalized to {statement}");

        let output = StaticTypeInferencer::new(
            &self.options.globals,
            &self.functions,
            &self.inference,
            &meta,
        )
        .infer(&statement)?;

        Ok(AnalysisOutcome {
            statement,
            meta,
            annotations: output.annotations,
            result_type: output.result_type,
            problems: output.problems,
        })
    }
}

impl Default for StaticAnalyzer {
    fn default() -> Self {
        Self::new(SemanticOptions::default())
    }
}
