// endpoint descriptions, call outcomes and dispatcher errors
pub mod base;
// per-endpoint circuit breaker state machine
pub mod circuitbreaker;
pub mod config;
pub mod dispatcher;
pub mod health;
// bounded concurrency per endpoint
pub mod isolation;
pub mod stat;
// forwarding of failures and health to the error-tracking collaborator
pub mod tracker;
