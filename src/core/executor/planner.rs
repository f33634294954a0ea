//! Turns previews and manual overrides into rename operations.

use super::types::*;
use std::collections::HashMap;
use tracing::debug;

/// Builds rename plans
pub struct RenamePlanner;

impl RenamePlanner {
    /// Plan from pipeline previews.
    ///
    /// A manual override (keyed by original index) wins over the preview,
    /// even when the preview failed. Files whose target equals their
    /// current name are skipped.
    pub fn plan(previews: &[FilePreview], overrides: &HashMap<usize, String>) -> RenamePlan {
        let mut ordered: Vec<&FilePreview> = previews.iter().collect();
        ordered.sort_by_key(|p| p.display_index);

        let mut plan = RenamePlan::default();
        for preview in ordered {
            let target = match (overrides.get(&preview.original_index), &preview.preview) {
                (Some(manual), _) => manual.clone(),
                (None, Ok(name)) => name.clone(),
                (None, Err(e)) => {
                    debug!(
                        file = %preview.current_name,
                        error = %e,
                        "Preview failed, not scheduling"
                    );
                    plan.failures.push(FailedFile {
                        source: preview.path.clone(),
                        target_name: String::new(),
                        kind: FailureKind::Preview,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            if target == preview.current_name {
                plan.skipped += 1;
                continue;
            }
            plan.operations.push(RenameOperation::new(
                preview.original_index,
                preview.path.clone(),
                target,
            ));
        }
        plan
    }

    /// Plan from explicit requests, in the given order
    pub fn from_requests(requests: &[RenameRequest]) -> RenamePlan {
        let mut plan = RenamePlan::default();
        for (index, request) in requests.iter().enumerate() {
            if file_name(&request.source_path) == request.target_name {
                plan.skipped += 1;
                continue;
            }
            plan.operations.push(RenameOperation::new(
                index,
                request.source_path.clone(),
                request.target_name.clone(),
            ));
        }
        plan
    }
}
