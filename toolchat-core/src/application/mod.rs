pub mod agent;
pub mod dispatcher;
pub mod registry;
pub mod stdio;
pub mod tooling;
