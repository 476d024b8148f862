/// OpenAPI documentation generation.
pub mod documentation;
/// Presenter-driven session lifecycle and round scoring.
pub mod driver_service;
/// Health check service.
pub mod health_service;
/// Player join and answer submission.
pub mod player_service;
/// Public read-only projections of live sessions.
pub mod public_service;
/// Admin CRUD over the question bank.
pub mod question_service;
/// Admin CRUD over session definitions.
pub mod session_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Session store connection supervisor.
pub mod storage_supervisor;
