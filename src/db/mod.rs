//! Record store repositories.
//!
//! Each function is a single read or write against the `SeaORM` entities, generic over
//! `ConnectionTrait` so it runs on a plain connection or inside a transaction. The domain
//! types in `core` never see entity models: conversion happens here.

/// Account data removal
pub mod account;
/// Cohorts and user profiles
pub mod cohorts;
/// Daily habits, check-ins, streaks, weekly exercise and breakfast photos
pub mod habits;
/// Meal options and meal selections
pub mod meals;
