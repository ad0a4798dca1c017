//! Route authorization for the portal shell.
//!
//! SYSTEM CONTEXT
//! ==============
//! `guard` decides every transition, `escalator` handles the router's error
//! channel, and `table` lists the pages the shell knows about. All three take
//! the session store as an argument; none of them owns state.

pub mod escalator;
pub mod guard;
pub mod table;
