//! # composite-core
//!
//! The composite-aggregation graph - THE LOGIC.
//!
//! Nodes form a multi-parent DAG. Any node may declare some of its
//! properties *composite*; on a node with children such a property stops
//! reading as a plain field and reads instead as the flattened aggregate of
//! the node's own value and every descendant's value. Properties declared
//! deep in the graph are adopted by every ancestor, and every structural or
//! value change is reported upward as a deduplicated notification once the
//! enclosing batch settles.
//!
//! ## Architectural Constraints
//!
//! - Single-threaded: the graph is owned, mutated through `&mut`
//! - Deterministic: ordered collections only, no hashing, no floats
//! - Arena storage: nodes are addressed by `NodeId`, never by reference
//! - No async, no I/O beyond loading a configuration file

// =============================================================================
// MODULES
// =============================================================================

pub mod accessor;
pub mod aggregation;
pub mod config;
pub mod graph;
pub mod lifecycle;
pub mod node;
pub mod primitives;
pub mod propagation;
pub mod relationship;
pub mod template;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{CompositeError, NodeId, Roster, Value};

// =============================================================================
// RE-EXPORTS: Graph Engine
// =============================================================================

pub use accessor::{Appending, Constant, PropertyAccessor};
pub use aggregation::{CompositeOperation, Get, count, flatten_into, sum_ints};
pub use config::{CompositeConfig, CyclePolicy};
pub use graph::CompositeGraph;
pub use node::Node;
pub use propagation::{ChangeSet, Notification, Subscription, SubscriptionId};
pub use relationship::RosterHandle;
pub use template::NodeTemplate;
