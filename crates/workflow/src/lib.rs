//! Generic typed-state workflow engine (§4.10/§4.11): named nodes over
//! [`hr_rag_core::TurnState`], static and conditional edges, sequential and
//! streaming execution. The HR policy pipeline itself is wired up using
//! this engine in the `hr-rag-rag` crate; nothing HR-specific lives here.

pub mod error;
pub mod graph;

pub use error::WorkflowError;
pub use graph::{Node, Router, StepEvent, Workflow, WorkflowBuilder, END};
