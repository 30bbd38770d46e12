pub mod action;
pub mod agent;
pub mod prelude;
pub mod q_table;
pub mod state;
pub mod util;
