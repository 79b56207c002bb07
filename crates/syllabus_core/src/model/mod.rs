//! Domain model for syllabus drafts and their wire payload.
//!
//! # Responsibility
//! - Define the Chapter -> Topic -> Subtopic draft tree.
//! - Define the id-free submission payload and subject choices.
//!
//! # Invariants
//! - Draft nodes are identified by locally generated `NodeId`s.
//! - Payloads never carry local ids.

pub mod payload;
pub mod subject;
pub mod syllabus;
