//! CTF Gatekeeper - access guards and rate limiting for CTF web applications
//!
//! Routes of a competition site are wrapped in guards that decide, per
//! request, whether the handler runs:
//!
//! - a fixed-window rate limiter counting calls per client and operation in
//!   a shared expiring counter store (in-memory or Redis)
//! - access guards for the competition window, sign-in, verified email,
//!   team membership and admin-only areas
//!
//! Layout follows ports and adapters: `domain` holds the decision rules,
//! `ports` the traits for the counter store, settings and clock,
//! `application` the services built on them, and `adapters` the store
//! implementations and axum middleware.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
