//! Application layer for GRaCE.
//!
//! Use cases coordinating the domain ports:
//! - [`SessionController`]: authentication lifecycle and the observable session.
//! - [`DossierService`]: per-user dossier CRUD.

pub mod dossier_service;
pub mod session_controller;

pub use dossier_service::DossierService;
pub use session_controller::SessionController;
