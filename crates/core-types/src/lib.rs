//! # BoviTrack Core Types
//!
//! The plain data records shared by every other crate: the English-named
//! entities (`Farm`, `Animal`, their weight records and veterinary visits,
//! `User`) and the parallel Spanish-named API surface (`Finca`, `Usuario`).
//!
//! Each entity carries its own validation and mapping helpers. Persistence
//! lives in the `database` crate; these types only derive `FromRow` so that
//! repositories can map rows explicitly.

pub mod animal;
pub mod enums;
pub mod error;
pub mod farm;
pub mod finca;
pub mod records;
pub mod user;
pub mod usuario;

// Re-export the core types to provide a clean public API.
pub use animal::{Animal, AnimalSummary, AnimalUpdate, NewAnimal, WeightPoint};
pub use enums::{Sex, UnknownRole, UserRole};
pub use error::{AnimalError, FarmError, FincaError, UsuarioError};
pub use farm::{Coordinates, Farm, FarmResponse, FarmUpdate, NewFarm};
pub use finca::{
    map_finca_to_response, validate_finca_create, validate_finca_update, Finca, FincaCreateInput,
    FincaResponse, FincaUpdateInput,
};
pub use records::{NewVeterinaryVisit, NewWeightRecord, VeterinaryVisit, WeightRecord};
pub use user::{SessionUser, User};
pub use usuario::{
    map_usuario_to_response, validate_usuario_create, validate_usuario_login,
    validate_usuario_update, Usuario, UsuarioCreateInput, UsuarioLoginInput, UsuarioResponse,
    UsuarioUpdateInput,
};
