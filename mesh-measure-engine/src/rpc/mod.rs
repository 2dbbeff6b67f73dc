//! JSON-RPC 2.0 communication layer for frontend integration.
//!
//! Implements bidirectional messaging between the engine and an embedding
//! web page via iframe postMessage: requests with IDs get responses,
//! notifications flow one way.
//!
//! ## Incoming methods
//!
//! - `tool_selection`: activate the distance or angle measurement mode
//! - `get_measurement`: fetch the last completed measurement
//! - `get_fps`: retrieve the current frame rate
//!
//! ## Outgoing notifications
//!
//! - `measure_started`: a measurement mode was activated
//! - `measure_point_added`: a pick was buffered
//! - `measure_completed`: a measurement finished, with its value
//! - `model_load_failed`: the manifest or model could not be loaded
//!
//! Native builds keep the same interface; the queues simply drain without a
//! parent window to post to.

/// JSON-RPC 2.0 bidirectional messaging and the WASM message listener.
pub mod web_rpc;
