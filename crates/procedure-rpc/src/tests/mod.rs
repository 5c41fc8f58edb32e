//! Test module for procedure-rpc
//!
//! Unit and property-based tests for the procedure model, dispatch pipeline,
//! hydration protocol, client stubs and HTTP front.

#[cfg(test)]
pub mod support;


#[cfg(test)]
pub mod dispatch_tests;



#[cfg(test)]
pub mod client_tests;


#[cfg(test)]
pub mod config_tests;

#[cfg(test)]
pub mod validation_tests;
