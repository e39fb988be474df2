//! Final packaging of a scored assessment.

use preview::PreviewRenderer;
use risk_common::RasterGrid;
use risk_scorer::RiskAssessment;
use tracing::warn;
use vegetation::VegetationIndexResult;

/// Attaches derived artifacts to a scored assessment.
#[derive(Debug, Clone, Default)]
pub struct ResultAssembler {
    renderer: PreviewRenderer,
}

impl ResultAssembler {
    pub fn new(renderer: PreviewRenderer) -> Self {
        Self { renderer }
    }

    /// Package `assessment`, rendering the NDVI overlay when asked.
    ///
    /// A preview that fails to render is logged and left out; it never fails
    /// the assessment.
    pub fn assemble(
        &self,
        mut assessment: RiskAssessment,
        index: &VegetationIndexResult,
        include_preview: bool,
    ) -> RiskAssessment {
        if include_preview {
            match self.renderer.render(index) {
                Ok(image) => assessment.preview = Some(image),
                Err(e) => warn!(error = %e, "Preview rendering failed, omitting preview"),
            }
        }
        assessment
    }

    /// Attach a true-colour image of the scene, with the same failure
    /// handling as [`assemble`](Self::assemble).
    pub fn attach_true_color(
        &self,
        mut assessment: RiskAssessment,
        red: &RasterGrid,
        green: &RasterGrid,
        blue: &RasterGrid,
    ) -> RiskAssessment {
        match self.renderer.render_true_color(red, green, blue) {
            Ok(image) => assessment.true_color_preview = Some(image),
            Err(e) => warn!(error = %e, "True-colour rendering failed, omitting image"),
        }
        assessment
    }
}
