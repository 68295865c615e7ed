//! # procvar: process-variable operation execution
//!
//! `procvar` is the operation-execution subsystem of a business-process
//! engine: it reads and mutates the different categories of state a running
//! process or activity instance can reference.
//!
//! - **Plain data** and **transient data**: typed rows mutated in place, with
//!   a runtime type-compatibility check on overwrite.
//! - **Business data**: domain entities linked through simple or multi
//!   references, updated through a merge/reference-rewrite action pipeline.
//! - **Documents** and **document lists**: versioned attachments with an
//!   idempotence short-circuit for unmodified re-assignments.
//! - **Search indexes**: the five denormalized string slots on a process
//!   instance row.
//!
//! One [`LeftOperandHandler`](handlers::LeftOperandHandler) per kind is
//! dispatched through a [`HandlerRegistry`](handlers::HandlerRegistry) built
//! at startup. The invoking engine drives each operation batch in two phases:
//! every `load_into_context` first, then expression evaluation, then every
//! `update`. Handlers are stateless; the per-batch
//! [`EvaluationContext`](context::EvaluationContext) is the only state shared
//! between phases.
//!
//! Persistence, sessions and the expression language live behind the traits
//! in [`services`]; this crate never talks to storage directly.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use procvar::{Container, EvaluationContext, HandlerRegistry, LeftOperand, OperandKind};
//!
//! let registry = HandlerRegistry::standard(&services);
//! let container = Container::process_instance(42);
//! let operand = LeftOperand::new("amount", OperandKind::Data);
//!
//! let mut ctx = EvaluationContext::new(container);
//! let handler = registry.handler_for(operand.kind())?;
//! handler.load_into_context(&operand, container, &mut ctx)?;
//! // ... evaluate expressions against ctx.values() ...
//! let stored = handler.update(&operand, &ctx, new_value, container)?;
//! ```

pub mod context;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod model;
pub mod services;
pub mod strategy;

pub use context::EvaluationContext;
pub use error::{OperationError, StoreError};
pub use handlers::{HandlerRegistry, LeftOperandHandler};
pub use model::{Container, ContainerType, LeftOperand, OperandKind, Operation};
pub use strategy::{OperationStrategy, StrategyRegistry};
