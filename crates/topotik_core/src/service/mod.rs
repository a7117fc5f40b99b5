//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Turn loosely-typed caller input (patch objects, raw passwords) into
//!   validated domain values before they reach storage.
//! - Keep the routing layer decoupled from storage details.

pub mod access_service;
pub mod article_service;
pub mod auth_service;
pub mod collection_service;
pub mod image_service;
pub mod map_service;
pub mod marker_service;
pub mod sharing_service;
