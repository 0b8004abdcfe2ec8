// Copyright 2026 the Appear Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Viewport appear/disappear transitions for observed elements.
//!
//! `appear_core` turns raw viewport-intersection measurements into discrete
//! `appear` / `disappear` notifications, each carrying a scroll direction and
//! optional once-only semantics. It is `no_std` compatible (with `alloc`) and
//! knows nothing about the DOM: platform crates supply the measurement
//! mechanism, element identity, attribute reads, and event delivery.
//!
//! # Architecture
//!
//! ```text
//!   Registry::observe(target)
//!       │
//!       ▼
//!   DetectorFactory::create() ──► Detector::observe()
//!                                     │  (host-scheduled)
//!                 ┌───────────────────┘
//!                 ▼
//!   &[Measurement] ──► TransitionEngine::evaluate() ──► Transition
//!                                                          │
//!                 ┌────────────────────────────────────────┘
//!                 ▼
//!   Notification ──► Dispatch::dispatch(target)
//! ```
//!
//! **[`registry`]**: The explicit observation context. Owns at most one
//! active detector, creates it lazily with default options, and wires its
//! measurement batches into the engine.
//!
//! **[`detector`]**: The [`Detector`](detector::Detector) and
//! [`DetectorFactory`](detector::DetectorFactory) contract plus the
//! capability-based [`DetectorKind`](detector::DetectorKind) selector.
//!
//! **[`fallback`]**: A geometry-driven detector for hosts without a native
//! intersection mechanism.
//!
//! **[`engine`]**: Per-element visibility state and the transition rules.
//!
//! **[`dispatch`]**: The typed [`Notification`](dispatch::Notification)
//! and the delivery seam.
//!
//! **[`host`]**: Element identity, attribute reads, and document root lookup.
//!
//! **[`options`]**: Root, root margin, and threshold configuration.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types, with
//! a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `libm` (disabled by default): Forwards `libm` to `kurbo`.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod detector;
pub mod dispatch;
pub mod element;
pub mod engine;
pub mod fallback;
pub mod host;
pub mod measurement;
pub mod options;
pub mod registry;
pub mod trace;
