// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared domain types for the secure-shed controllers: the event bus, the
//! `authorisationKey` auth middleware, the console log ring, and the wire
//! schemas common to both HTTP surfaces.

pub mod auth;
pub mod event;
pub mod httpclient;
pub mod logstore;
pub mod tracing_sink;
pub mod wire;
