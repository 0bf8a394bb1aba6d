//! Session layer: cursor, reversible mutations, undo history, registers.

pub mod cursor;
pub mod events;
pub mod history;
pub mod mutation;
pub mod register;
pub mod session;

pub use cursor::Cursor;
pub use events::{SessionEvent, SessionEventRegistry};
pub use history::{HistoryEntry, ViewState};
pub use mutation::Mutation;
pub use register::{Register, RegisterContent};
pub use session::{Direction, Session};
