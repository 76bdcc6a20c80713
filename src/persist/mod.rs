//! Persistence: the map/set JSON codec, key/value stores, and the bridge
//! that mirrors state slices into a store.

pub mod bridge;
pub mod codec;
pub mod storage;

pub use bridge::{PersistError, load_slice, load_workspace, save_slice, save_workspace};
pub use codec::{CodecError, StateValue};
pub use storage::{DirStore, KeyValueStore, MemoryStore, StorageError};
