//! Integration Tests Module
//!
//! End-to-end tests for Interview Arena. Every test runs against an
//! in-memory or temp-dir SQLite database and a stub provider; no network
//! calls are made.

// Shared fixtures (stub provider, test router)
mod common;

// HTTP API: health, settings, scenarios, feedback, question sets
mod api_test;

// Live practice sessions over HTTP
mod practice_test;

// File-backed database and configuration
mod storage_test;
