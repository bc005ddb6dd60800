pub mod artifact_service;
pub mod like_reconciler;
pub mod like_registry;
