//! Exam scheduling.
//!
//! Sessions book a room, an invigilator and a window of consecutive
//! time slots on a day. Conflict checks compare slot indices as
//! half-open ranges, so windows that merely touch do not collide.
//! The roster allocator fills seats with eligible students.

pub mod conflict;
pub mod controller;
pub mod model;
pub mod roster;
pub mod router;
pub mod service;
