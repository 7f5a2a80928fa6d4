pub mod control;
pub mod dispatcher;
pub mod providers;
pub mod strategies;
