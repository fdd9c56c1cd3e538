//! Ordered milestone log for one pipeline run.
//!
//! Captures state entries, actions, and tool outputs so the caller can
//! replay what the machine did. Returned verbatim in the ask response.

use serde::{Deserialize, Serialize};

/// What a milestone records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum MilestoneKind {
    /// The machine entered a state.
    StateEntered,
    /// An action taken inside a state.
    Action,
    /// Output from a tool (generator, validator, executor).
    ToolOutput,
}

/// One entry in the pipeline log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Milestone {
    pub kind: MilestoneKind,
    pub message: String,
}

/// Append-only log of pipeline milestones, in occurrence order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct PipelineLog(Vec<Milestone>);

impl PipelineLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&mut self, name: &str) {
        self.push(MilestoneKind::StateEntered, format!("entered {}", name));
    }

    pub fn action(&mut self, message: impl Into<String>) {
        self.push(MilestoneKind::Action, message);
    }

    pub fn tool_output(&mut self, message: impl Into<String>) {
        self.push(MilestoneKind::ToolOutput, message);
    }

    fn push(&mut self, kind: MilestoneKind, message: impl Into<String>) {
        self.0.push(Milestone {
            kind,
            message: message.into(),
        });
    }

    pub fn entries(&self) -> &[Milestone] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_preserves_order() {
        let mut log = PipelineLog::new();
        log.state("generate_sql");
        log.action("generating candidate SQL (attempt 1)");
        log.tool_output("SELECT 1");

        let kinds: Vec<MilestoneKind> = log.entries().iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MilestoneKind::StateEntered,
                MilestoneKind::Action,
                MilestoneKind::ToolOutput
            ]
        );
        assert_eq!(log.entries()[0].message, "entered generate_sql");
    }

    #[test]
    fn test_log_serializes_as_array() {
        let mut log = PipelineLog::new();
        log.state("validate_sql");
        let json = serde_json::to_value(&log).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["kind"], "state_entered");
    }
}
