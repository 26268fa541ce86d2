//! Event loops driving the agents.

pub mod host_loop;
