use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::tools::measure::{MeasureMode, MeasureSession};
use crate::tools::tool_manager::{MeasureModeEvent, MeasureModeSource};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcError>,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
}

/// JSON-RPC error structure following the specification.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }
}

/// Resource managing RPC communication with an embedding frontend.
/// Handles both request-response patterns and notification broadcasting.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send a notification to the frontend without expecting a response.
    pub fn send_notification(&mut self, method: &str, params: serde_json::Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }
}

/// Plugin establishing the RPC layer for iframe-based deployment.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .add_event::<IncomingRpcMessage>()
            .add_systems(
                Update,
                (
                    process_incoming_messages,
                    handle_rpc_messages,
                    send_outgoing_messages,
                )
                    .chain(),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::{Arc, Mutex};

    // Thread-safe message queue for cross-thread communication.
    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();
            if message_str.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message_str);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    if let Some(window) = window() {
        window
            .add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
            .expect("Failed to register message listener");
    }

    // Transfer closure ownership to JS so it outlives this system.
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

/// Resource wrapping the thread-safe message queue for WASM event handling.
#[derive(Resource)]
struct MessageQueue(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

/// Event representing an incoming RPC message from the frontend.
#[derive(Event)]
struct IncomingRpcMessage {
    content: String,
}

fn process_incoming_messages(
    message_queue: Option<Res<MessageQueue>>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    let Some(queue_res) = message_queue else {
        return;
    };

    let messages = if let Ok(mut queue) = queue_res.0.lock() {
        std::mem::take(&mut *queue)
    } else {
        Vec::new()
    };

    for message_str in messages {
        message_events.write(IncomingRpcMessage {
            content: message_str,
        });
    }
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    diagnostics: Res<DiagnosticsStore>,
    session: Res<MeasureSession>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut mode_events: EventWriter<MeasureModeEvent>,
) {
    for event in events.read() {
        match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => {
                if let Some(response) =
                    handle_rpc_request(&request, &diagnostics, &session, &mut mode_events)
                {
                    rpc_interface.queue_response(response);
                }
            }
            Err(parse_error) => {
                warn!("Unparseable RPC message: {parse_error}");
            }
        }
    }
}

/// Handle an individual RPC request and generate a response by method.
fn handle_rpc_request(
    request: &RpcRequest,
    diagnostics: &DiagnosticsStore,
    session: &MeasureSession,
    mode_events: &mut EventWriter<MeasureModeEvent>,
) -> Option<RpcResponse> {
    // Only requests with IDs get responses; notifications have no ID.
    let id = request.id.clone()?;

    let result = match request.method.as_str() {
        "tool_selection" => handle_tool_selection(&request.params, mode_events),
        "get_measurement" => handle_get_measurement(session),
        "get_fps" => handle_get_fps(diagnostics),
        _ => {
            warn!("Unknown RPC method: {}", request.method);
            return Some(create_error_response(
                id,
                -32601,
                "Method not found",
                Some(serde_json::json!({ "method": request.method })),
            ));
        }
    };

    match result {
        Ok(result_value) => Some(RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result_value),
            error: None,
            id: Some(id),
        }),
        Err(error) => Some(RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id: Some(id),
        }),
    }
}

/// Map a `tool_selection` request onto a mode event.
fn handle_tool_selection(
    params: &serde_json::Value,
    mode_events: &mut EventWriter<MeasureModeEvent>,
) -> Result<serde_json::Value, RpcError> {
    #[derive(Deserialize)]
    struct ToolSelectionParams {
        tool: String,
    }

    let tool_params = serde_json::from_value::<ToolSelectionParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'tool' parameter"))?;

    let mode = MeasureMode::from_string(&tool_params.tool)
        .ok_or_else(|| RpcError::invalid_params(&format!("Unknown tool: {}", tool_params.tool)))?;

    mode_events.write(MeasureModeEvent {
        mode,
        source: MeasureModeSource::Rpc,
    });

    info!("Measurement mode event dispatched via RPC: {mode:?}");

    Ok(serde_json::json!({
        "success": true,
        "active_tool": tool_params.tool
    }))
}

/// Return the last completed measurement, if any.
fn handle_get_measurement(session: &MeasureSession) -> Result<serde_json::Value, RpcError> {
    match session.current() {
        Some(measurement) => serde_json::to_value(measurement)
            .map_err(|e| RpcError::invalid_params(&e.to_string())),
        None => Ok(serde_json::Value::Null),
    }
}

fn handle_get_fps(diagnostics: &DiagnosticsStore) -> Result<serde_json::Value, RpcError> {
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps_diagnostic| fps_diagnostic.smoothed())
        .unwrap_or(0.0) as f32;

    Ok(serde_json::json!({ "fps": fps }))
}

fn create_error_response(
    id: serde_json::Value,
    code: i32,
    message: &str,
    data: Option<serde_json::Value>,
) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0".to_string(),
        result: None,
        error: Some(RpcError {
            code,
            message: message.to_string(),
            data,
        }),
        id: Some(id),
    }
}

/// Flush queued notifications and responses to the frontend.
fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    for notification in rpc_interface.outgoing_notifications.drain(..) {
        send_message_to_parent(&notification);
    }
    for response in rpc_interface.outgoing_responses.drain(..) {
        send_message_to_parent(&response);
    }
}

/// Send a serialized message to the parent window.
fn send_message_to_parent<T: Serialize>(message: &T) {
    #[cfg(target_arch = "wasm32")]
    {
        match serde_json::to_string(message) {
            Ok(json) => {
                if let Some(window) = window() {
                    if let Some(parent) = window.parent().ok().flatten() {
                        if let Err(e) = parent.post_message(&JsValue::from_str(&json), "*") {
                            error!("Failed to send message to parent: {e:?}");
                        }
                    } else {
                        warn!("No parent window available for message transmission");
                    }
                } else {
                    error!("Window object not available");
                }
            }
            Err(e) => {
                error!("Failed to serialize message: {e}");
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
    }
}
