//! Chaincode contract surface: the seam between host and contract.
//!
//! The host builds an [`Invocation`], pairs it with its world state in a
//! [`Stub`], and hands the stub to a [`Chaincode`]. The chaincode answers
//! with a [`Response`]; it never panics on bad input and never retries.
//!
//! ```text
//! host ──Invocation──▶ Stub { tx_id, function, args, &dyn WorldState }
//!                         │
//!                         ▼
//!                 Chaincode::invoke ──▶ Response { status, message, payload }
//! ```

pub mod invocation;
pub mod member;
pub mod response;

pub use invocation::Invocation;
pub use member::{MemberContract, MemberRecord};
pub use response::Response;

use thiserror::Error;
use tracing::{info, info_span, warn};

use crate::error::AppError;
use crate::ledger::WorldState;

/// Contract-level failures. `Display` is the message returned to the caller.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("incorrect number of arguments for {operation}: expecting {expected}, got {got}")]
    InvalidArgumentCount {
        operation: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("member {0} already exists")]
    AlreadyExists(String),

    #[error("requested member {0} is missing")]
    NotFound(String),

    #[error("invalid smart contract function name: '{0}'")]
    InvalidOperation(String),

    #[error("cannot serialise member record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    State(#[from] AppError),
}

/// Per-invocation view handed to chaincode.
pub struct Stub<'a> {
    state: &'a dyn WorldState,
    invocation: Invocation,
}

impl<'a> Stub<'a> {
    pub fn new(state: &'a dyn WorldState, invocation: Invocation) -> Self {
        Self { state, invocation }
    }

    pub fn tx_id(&self) -> &str {
        &self.invocation.tx_id
    }

    pub fn function_and_parameters(&self) -> (&str, &[String]) {
        (&self.invocation.function, &self.invocation.args)
    }

    pub fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        self.state.get_state(key)
    }

    pub fn put_state(&self, key: &str, value: &[u8]) -> Result<(), AppError> {
        self.state.put_state(key, value)
    }

    pub fn del_state(&self, key: &str) -> Result<(), AppError> {
        self.state.del_state(key)
    }
}

/// A contract the host can instantiate and invoke.
pub trait Chaincode: Send + Sync {
    /// Chaincode name as registered with the host.
    fn name(&self) -> &str;

    /// Instantiate hook. Default: succeed without touching state.
    fn init(&self, _stub: &Stub<'_>) -> Response {
        Response::success(None)
    }

    /// Handle one invocation.
    fn invoke(&self, stub: &Stub<'_>) -> Response;
}

/// Run `invocation` through `chaincode` inside a span carrying the tx id.
pub fn execute(chaincode: &dyn Chaincode, state: &dyn WorldState, invocation: Invocation) -> Response {
    let span = info_span!(
        "invoke",
        chaincode = chaincode.name(),
        tx_id = %invocation.tx_id,
        function = %invocation.function
    );
    let _entered = span.enter();

    let stub = Stub::new(state, invocation);
    let response = chaincode.invoke(&stub);
    if response.is_ok() {
        info!(status = response.status, "invocation succeeded");
    } else {
        warn!(status = response.status, message = %response.message, "invocation failed");
    }
    response
}

/// Run the instantiate hook of `chaincode`.
pub fn instantiate(chaincode: &dyn Chaincode, state: &dyn WorldState, invocation: Invocation) -> Response {
    let span = info_span!("init", chaincode = chaincode.name(), tx_id = %invocation.tx_id);
    let _entered = span.enter();

    let response = chaincode.init(&Stub::new(state, invocation));
    info!(status = response.status, "chaincode initialised");
    response
}
