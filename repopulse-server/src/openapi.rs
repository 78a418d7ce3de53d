//! OpenAPI specification for RepoPulse server.

use utoipa::OpenApi;

use repopulse_core::{
    CommitPoint, ComplexityMetrics, ContributorBasic, EnrichedContributor, FileAnalysisResult,
    FolderSummary, HalsteadAverages, HalsteadMetrics,
};

use crate::routes::{AnalyzeFileRequest, AnalyzeFolderRequest, ErrorResponse, HealthResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::contributors,
        crate::routes::analyze_file,
        crate::routes::analyze_folder,
        crate::routes::github_list_files,
        crate::routes::github_get_file,
        crate::routes::health,
        crate::routes::openapi_json
    ),
    components(
        schemas(
            ContributorBasic,
            CommitPoint,
            EnrichedContributor,
            HalsteadMetrics,
            ComplexityMetrics,
            FileAnalysisResult,
            HalsteadAverages,
            FolderSummary,
            AnalyzeFileRequest,
            AnalyzeFolderRequest,
            HealthResponse,
            ErrorResponse
        )
    ),
    tags(
        (name = "contributors", description = "Contributor activity"),
        (name = "analysis", description = "Code quality analysis"),
        (name = "github", description = "Repository contents"),
        (name = "system", description = "System endpoints")
    )
)]
/// OpenAPI specification for the RepoPulse server.
pub struct ApiDoc;
