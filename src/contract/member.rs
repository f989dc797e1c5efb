//! Member chaincode: create, update, delete and query member records keyed
//! by member number.
//!
//! | function  | alias    | args                                               | payload |
//! |-----------|----------|----------------------------------------------------|---------|
//! | `memberc` | `create` | number, id, name, password hash, wallet key, date  | none    |
//! | `memberu` | `update` | number, name, password hash, wallet key            | none    |
//! | `memberd` | `delete` | number                                             | none    |
//! | `query`   |          | number                                             | record  |
//!
//! Each call does one lookup and at most one mutation. Records are stored as
//! compact JSON under the member number.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Chaincode, ContractError, Response, Stub};

/// Persisted member record. Field order is the serialised key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    #[serde(rename = "memberno")]
    pub member_number: String,
    #[serde(rename = "memberid")]
    pub member_id: String,
    #[serde(rename = "membername")]
    pub member_name: String,
    /// Opaque to the contract; never hashed or checked here.
    #[serde(rename = "memberpwd")]
    pub member_password_hash: String,
    #[serde(rename = "membertoethereumkey")]
    pub member_linked_wallet_key: String,
    #[serde(rename = "memberentrydate")]
    pub member_entry_date: String,
}

impl MemberRecord {
    pub fn to_bytes(&self) -> Result<Vec<u8>, ContractError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ContractError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Closed set of functions this chaincode answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberOperation {
    Create,
    Update,
    Delete,
    Query,
}

impl MemberOperation {
    /// Canonical function name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "memberc",
            Self::Update => "memberu",
            Self::Delete => "memberd",
            Self::Query => "query",
        }
    }

    /// Exact number of parameters the function takes.
    pub fn arity(self) -> usize {
        match self {
            Self::Create => 6,
            Self::Update => 4,
            Self::Delete | Self::Query => 1,
        }
    }
}

impl FromStr for MemberOperation {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memberc" | "create" => Ok(Self::Create),
            "memberu" | "update" => Ok(Self::Update),
            "memberd" | "delete" => Ok(Self::Delete),
            "query" => Ok(Self::Query),
            other => Err(ContractError::InvalidOperation(other.to_string())),
        }
    }
}

/// A validated request, arguments bound to their fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberCommand {
    Create(MemberRecord),
    Update {
        member_number: String,
        member_name: String,
        member_password_hash: String,
        member_linked_wallet_key: String,
    },
    Delete { member_number: String },
    Query { member_number: String },
}

impl MemberCommand {
    /// Resolve `function` and bind `args`. The function name is checked
    /// before the argument count.
    pub fn parse(function: &str, args: &[String]) -> Result<Self, ContractError> {
        let op: MemberOperation = function.parse()?;
        if args.len() != op.arity() {
            return Err(ContractError::InvalidArgumentCount {
                operation: op.as_str(),
                expected: op.arity(),
                got: args.len(),
            });
        }

        let command = match (op, args) {
            (MemberOperation::Create, [number, id, name, pwd, wallet, date]) => {
                Self::Create(MemberRecord {
                    member_number: number.clone(),
                    member_id: id.clone(),
                    member_name: name.clone(),
                    member_password_hash: pwd.clone(),
                    member_linked_wallet_key: wallet.clone(),
                    member_entry_date: date.clone(),
                })
            }
            (MemberOperation::Update, [number, name, pwd, wallet]) => Self::Update {
                member_number: number.clone(),
                member_name: name.clone(),
                member_password_hash: pwd.clone(),
                member_linked_wallet_key: wallet.clone(),
            },
            (MemberOperation::Delete, [number]) => Self::Delete {
                member_number: number.clone(),
            },
            (MemberOperation::Query, [number]) => Self::Query {
                member_number: number.clone(),
            },
            // Arity was checked above; every remaining shape is a count mismatch.
            (op, _) => {
                return Err(ContractError::InvalidArgumentCount {
                    operation: op.as_str(),
                    expected: op.arity(),
                    got: args.len(),
                });
            }
        };
        Ok(command)
    }

    pub fn member_number(&self) -> &str {
        match self {
            Self::Create(record) => &record.member_number,
            Self::Update { member_number, .. }
            | Self::Delete { member_number }
            | Self::Query { member_number } => member_number,
        }
    }
}

/// Stateless member chaincode. Construct one per invocation or share freely.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemberContract;

impl MemberContract {
    pub fn new() -> Self {
        Self
    }

    /// Parse and run the stub's invocation; `Ok` carries the optional payload.
    pub fn dispatch(&self, stub: &Stub<'_>) -> Result<Option<Vec<u8>>, ContractError> {
        let (function, args) = stub.function_and_parameters();
        let command = MemberCommand::parse(function, args)?;
        debug!(key = command.member_number(), "dispatching {function}");

        match command {
            MemberCommand::Create(record) => self.create(stub, record).map(|()| None),
            MemberCommand::Update {
                member_number,
                member_name,
                member_password_hash,
                member_linked_wallet_key,
            } => {
                // Only these four fields survive an update; member id and
                // entry date are reset to empty.
                let record = MemberRecord {
                    member_number,
                    member_name,
                    member_password_hash,
                    member_linked_wallet_key,
                    ..MemberRecord::default()
                };
                self.update(stub, record).map(|()| None)
            }
            MemberCommand::Delete { member_number } => {
                self.delete(stub, &member_number).map(|()| None)
            }
            MemberCommand::Query { member_number } => self.query(stub, &member_number).map(Some),
        }
    }

    fn create(&self, stub: &Stub<'_>, record: MemberRecord) -> Result<(), ContractError> {
        if stub.get_state(&record.member_number)?.is_some() {
            return Err(ContractError::AlreadyExists(record.member_number));
        }
        stub.put_state(&record.member_number, &record.to_bytes()?)?;
        Ok(())
    }

    fn update(&self, stub: &Stub<'_>, record: MemberRecord) -> Result<(), ContractError> {
        self.require(stub, &record.member_number)?;
        stub.put_state(&record.member_number, &record.to_bytes()?)?;
        Ok(())
    }

    fn delete(&self, stub: &Stub<'_>, member_number: &str) -> Result<(), ContractError> {
        self.require(stub, member_number)?;
        stub.del_state(member_number)?;
        Ok(())
    }

    fn query(&self, stub: &Stub<'_>, member_number: &str) -> Result<Vec<u8>, ContractError> {
        self.require(stub, member_number)
    }

    /// Stored bytes for `member_number`, or `NotFound`.
    fn require(&self, stub: &Stub<'_>, member_number: &str) -> Result<Vec<u8>, ContractError> {
        stub.get_state(member_number)?
            .ok_or_else(|| ContractError::NotFound(member_number.to_string()))
    }
}

impl Chaincode for MemberContract {
    fn name(&self) -> &str {
        "member"
    }

    fn invoke(&self, stub: &Stub<'_>) -> Response {
        match self.dispatch(stub) {
            Ok(payload) => Response::success(payload),
            Err(e) => Response::error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::Invocation;
    use crate::ledger::{MemoryWorldState, WorldState};

    const ALICE: &str = r#"{"memberno":"001","memberid":"u1","membername":"Alice","memberpwd":"hash1","membertoethereumkey":"0xabc","memberentrydate":"2024-01-01"}"#;

    fn call(state: &MemoryWorldState, args: &[&str]) -> Result<Option<Vec<u8>>, ContractError> {
        let stub = Stub::new(state, Invocation::from_args(args.iter().copied()));
        MemberContract::new().dispatch(&stub)
    }

    fn create_alice(state: &MemoryWorldState) {
        call(state, &["memberc", "001", "u1", "Alice", "hash1", "0xabc", "2024-01-01"]).unwrap();
    }

    #[test]
    fn create_then_query_returns_record() {
        let state = MemoryWorldState::new();
        let created = call(&state, &["memberc", "001", "u1", "Alice", "hash1", "0xabc", "2024-01-01"]);
        assert_eq!(created.unwrap(), None);

        let payload = call(&state, &["query", "001"]).unwrap().unwrap();
        assert_eq!(String::from_utf8(payload).unwrap(), ALICE);
    }

    #[test]
    fn create_existing_fails_and_keeps_record() {
        let state = MemoryWorldState::new();
        create_alice(&state);

        let err = call(&state, &["memberc", "001", "u2", "Bob", "hash2", "0xdef", "2025-02-02"]).unwrap_err();
        assert!(matches!(err, ContractError::AlreadyExists(ref k) if k == "001"));
        assert_eq!(state.get_state("001").unwrap().unwrap(), ALICE.as_bytes());
    }

    #[test]
    fn update_missing_is_not_found() {
        let state = MemoryWorldState::new();
        let err = call(&state, &["memberu", "404", "Nobody", "h", "0x0"]).unwrap_err();
        assert!(matches!(err, ContractError::NotFound(ref k) if k == "404"));
        assert!(state.is_empty().unwrap());
    }

    #[test]
    fn update_keeps_only_supplied_fields() {
        let state = MemoryWorldState::new();
        create_alice(&state);

        assert_eq!(call(&state, &["memberu", "001", "Alicia", "hash9", "0xfff"]).unwrap(), None);

        let payload = call(&state, &["query", "001"]).unwrap().unwrap();
        let record = MemberRecord::from_bytes(&payload).unwrap();
        assert_eq!(
            record,
            MemberRecord {
                member_number: "001".into(),
                member_id: String::new(),
                member_name: "Alicia".into(),
                member_password_hash: "hash9".into(),
                member_linked_wallet_key: "0xfff".into(),
                member_entry_date: String::new(),
            }
        );
        assert!(String::from_utf8(payload).unwrap().contains(r#""memberid":"""#));
    }

    #[test]
    fn delete_removes_record() {
        let state = MemoryWorldState::new();
        create_alice(&state);

        assert_eq!(call(&state, &["memberd", "001"]).unwrap(), None);
        let err = call(&state, &["query", "001"]).unwrap_err();
        assert!(matches!(err, ContractError::NotFound(_)));
    }

    #[test]
    fn delete_missing_is_not_found() {
        let state = MemoryWorldState::new();
        let err = call(&state, &["memberd", "001"]).unwrap_err();
        assert!(matches!(err, ContractError::NotFound(_)));
    }

    #[test]
    fn unknown_function_regardless_of_args() {
        let state = MemoryWorldState::new();
        let cases: [&[&str]; 3] = [&["memberx"], &["memberx", "001"], &["", "a", "b", "c", "d", "e", "f"]];
        for args in cases {
            let err = call(&state, args).unwrap_err();
            assert!(matches!(err, ContractError::InvalidOperation(_)), "args: {args:?}");
        }
        assert!(matches!(
            call(&state, &[]).unwrap_err(),
            ContractError::InvalidOperation(ref f) if f.is_empty()
        ));
    }

    #[test]
    fn wrong_arg_count_does_not_touch_state() {
        let state = MemoryWorldState::new();
        create_alice(&state);

        let cases: [(&[&str], &str, usize, usize); 4] = [
            (&["memberc", "002", "u2"], "memberc", 6, 2),
            (&["memberu", "001", "Alicia", "hash9"], "memberu", 4, 3),
            (&["memberd"], "memberd", 1, 0),
            (&["query", "001", "002"], "query", 1, 2),
        ];
        for (args, op, expected, got) in cases {
            match call(&state, args).unwrap_err() {
                ContractError::InvalidArgumentCount { operation, expected: e, got: g } => {
                    assert_eq!((operation, e, g), (op, expected, got));
                }
                other => panic!("unexpected error for {args:?}: {other}"),
            }
        }
        assert_eq!(state.len().unwrap(), 1);
        assert_eq!(state.get_state("001").unwrap().unwrap(), ALICE.as_bytes());
    }

    #[test]
    fn aliases_map_to_canonical_operations() {
        assert_eq!("create".parse::<MemberOperation>().unwrap(), MemberOperation::Create);
        assert_eq!("update".parse::<MemberOperation>().unwrap(), MemberOperation::Update);
        assert_eq!("delete".parse::<MemberOperation>().unwrap(), MemberOperation::Delete);
        assert_eq!(MemberOperation::Delete.as_str(), "memberd");
        assert!("Query".parse::<MemberOperation>().is_err());
    }

    #[test]
    fn invoke_maps_errors_to_responses() {
        let state = MemoryWorldState::new();
        let contract = MemberContract::new();

        let missing = contract.invoke(&Stub::new(&state, Invocation::from_args(["query", "001"])));
        assert_eq!(missing.status, crate::contract::response::ERROR);
        assert_eq!(missing.message, "requested member 001 is missing");

        create_alice(&state);
        let found = contract.invoke(&Stub::new(&state, Invocation::from_args(["query", "001"])));
        assert!(found.is_ok());
        assert_eq!(found.payload_lossy(), ALICE);
    }

    #[test]
    fn query_returns_stored_bytes_verbatim() {
        let state = MemoryWorldState::new();
        state.put_state("raw", b"{\"memberno\": \"raw\"}").unwrap();
        let payload = call(&state, &["query", "raw"]).unwrap().unwrap();
        assert_eq!(payload, b"{\"memberno\": \"raw\"}");
    }
}
