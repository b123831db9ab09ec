// Every instruction module exports a `handler`
#![allow(ambiguous_glob_reexports)]

pub mod add_strategy;
pub mod admin;
pub mod deposit;
pub mod initialize;
pub mod migrate_strategy;
pub mod report;
pub mod view;
pub mod withdraw;

pub use add_strategy::*;
pub use admin::*;
pub use deposit::*;
pub use initialize::*;
pub use migrate_strategy::*;
pub use report::*;
pub use view::*;
pub use withdraw::*;
