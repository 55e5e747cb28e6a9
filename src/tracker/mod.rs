//! Domain core of ticktrack. The store and its persistence are organized as such:
//!  - [store::Store] keeps projects, iterations, tickets and time entries in memory and enforces
//!    every invariant, including cascades on delete.
//!  - [database::Database] persists the whole store as one file.
//!  - [timer::Timer] and [report::build_report] only read from the store; callers write.

pub mod database;
pub mod entities;
pub mod import;
pub mod report;
pub mod store;
pub mod timer;
pub mod validation;
