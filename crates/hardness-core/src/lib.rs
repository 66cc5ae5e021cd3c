//! hardness-core: security resolution over a knowledge base of
//! cryptographic hardness assumptions
//!
//! The knowledge base holds three tables:
//! - Attacks: known algorithms, each with a complexity class and a flag
//!   telling whether it needs a quantum computer
//! - Assumptions: presumed-hard problems, with direct attacks and
//!   reductions to other assumptions
//! - Schemes: constructions that are secure only while all of their
//!   assumptions hold
//!
//! Any node may carry named variants (specializations of the same kind).
//!
//! # Threat models
//!
//! Every query runs either classically (`quantum = false`), where
//! quantum-only attacks are invisible, or against a quantum adversary
//! (`quantum = true`), where every attack counts.
//!
//! # Lifecycle
//!
//! Records are loaded, every node is constructed, edges are linked once,
//! and from then on the graph is only read. See [`Resolver`] for the
//! resolution rules.
//!
//! ```no_run
//! use hardness_core::{KbConfig, KnowledgeBase};
//!
//! fn main() -> hardness_core::Result<()> {
//!     let kb = KnowledgeBase::load(&KbConfig::from_base_dir("./data"))?;
//!     let resolver = kb.resolver();
//!     let dlog = kb.assumption("dlog")?;
//!     println!("{}", resolver.security(dlog, true)?);
//!     Ok(())
//! }
//! ```

mod complexity;
mod config;
mod error;
mod kb;
mod link;
mod node;
pub mod records;
pub mod report;
mod resolver;

pub use complexity::{Classification, ComplexityClass, Quantity, Rational};
pub use config::{KbConfig, UnknownPolicy};
pub use error::Error;
pub use kb::KnowledgeBase;
pub use link::LinkStats;
pub use node::{
    Assumption, AssumptionId, Attack, AttackId, Name, Node, NodeData, NodeId, NodeKind, Reduction,
    References, Scheme, SchemeId, Table, LONGID_SEPARATOR,
};
pub use records::Records;
pub use report::{Report, Reporter};
pub use resolver::{minimum, AttackView, Resolver, Visiting};

pub type Result<T> = std::result::Result<T, Error>;
