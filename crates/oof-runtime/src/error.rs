use oof_dom::{DomError, NodeId};
use oof_reactive::ValuesError;
use thiserror::Error;

/// The rule a component broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Contract {
    #[error("dependency read failed: {0}")]
    Dependency(#[from] ValuesError),

    #[error("render returned {0:?}, which is no longer in the document")]
    StaleNode(NodeId),

    #[error("render returned {0:?}, which is already attached")]
    AttachedNode(NodeId),

    #[error("render returned the document body")]
    DocumentRoot,

    #[error("mounted into a different document")]
    ForeignDocument,
}

/// Component failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElError {
    #[error("component `{component}` broke its contract: {contract}")]
    ContractViolation {
        component: &'static str,
        contract: Contract,
    },

    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Dom(#[from] DomError),
}

impl ElError {
    pub(crate) fn contract(component: &'static str, contract: impl Into<Contract>) -> Self {
        Self::ContractViolation {
            component,
            contract: contract.into(),
        }
    }

    /// Whether this error is a broken component contract.
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::ContractViolation { .. })
    }
}
