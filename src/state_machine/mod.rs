// Job lifecycle state machine
//
// Statuses, the events that move between them, and the guard that owns the
// transition graph. The Job Store is the only caller that applies transitions.

pub mod events;
pub mod guards;
pub mod states;

pub use events::JobEvent;
pub use guards::TransitionGuard;
pub use states::JobStatus;
