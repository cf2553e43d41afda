pub mod delta;
pub mod error;
pub mod instance;
pub mod jsonrpc;


pub use delta::{ChangeOperation, ChangeRecord, DeltaBatch};
pub use error::{RegcacheError, Result};
pub use instance::{InstanceRecord, RegistryMap, RegistrySnapshot};
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
