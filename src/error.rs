//! Error taxonomy for the lowering engine (spec §7).

use thiserror::Error;

use crate::qubit::QubitId;

/// Every fallible operation in this crate returns `Result<T, Error>`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("qubit {0:?} does not exist in this computation")]
    InvalidQubit(QubitId),

    #[error("target qubit {0:?} is in the active control set")]
    OverlapControlTarget(QubitId),

    #[error("label {0:?} is already in use")]
    DuplicateLabel(String),

    #[error("cannot allocate a qubit after the computation has been frozen")]
    AllocationAfterFreeze,

    #[error("entry module {0:?} could not be resolved")]
    UnknownModule(String),

    #[error("variable {0:?} is not bound in the current scope")]
    UnknownVariable(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("module {0:?} is already being synthesized higher up the call stack")]
    RecursiveModuleCall(String),
}

pub type Result<T> = std::result::Result<T, Error>;
