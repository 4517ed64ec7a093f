use thiserror::Error;

/// Failures of operations on the `Farm` entity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FarmError {
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Finca no encontrada")]
    NotFound,
}

/// Failures of operations on the `Animal` entity and its records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnimalError {
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Animal no encontrado")]
    NotFound,

    #[error("Ya existe un animal con el arete {0}")]
    DuplicateEarTag(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FincaError {
    #[error("{0}")]
    Validation(String),

    #[error("Finca no encontrada")]
    NotFound,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsuarioError {
    #[error("{0}")]
    Validation(String),

    #[error("Usuario no encontrado")]
    NotFound,

    #[error("El usuario ya existe")]
    Duplicate,
}
