//! Dossier domain module.

mod id;
mod model;
mod repository;

pub use id::{
    Clock, DOSSIER_ID_PREFIX, DossierIdGenerator, SystemClock, TimestampIdGenerator,
    UuidIdGenerator,
};
pub use model::{Document, Dossier, DossierPatch, DossierStatus, DossierType, NewDossier};
pub use repository::DossierRepository;
