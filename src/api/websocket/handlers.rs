use actix::{
    Actor, ActorContext, ActorFutureExt, AsyncContext, SpawnHandle, StreamHandler, WrapFuture,
};
use actix_web_actors::ws;
use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::api::AppState;
use crate::models::{MerchantCategory, SessionId, TransactionContext};
use crate::security::analysis::{AnalysisOutcome, EnvironmentInfo, TransactionAnalyzer};
use crate::security::behavioral_biometrics::{BiometricEngine, BiometricEvent, BiometricSnapshot};
use crate::security::factors::{evaluate_factors, BiometricFactor};

// Control messages understood besides raw biometric events
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    Context {
        #[serde(default)]
        amount: String,
        #[serde(default, rename = "merchantType")]
        merchant_type: MerchantCategory,
    },
    Snapshot,
    Analyze {
        #[serde(default)]
        environment: EnvironmentInfo,
    },
}

// Anything a client may send
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ClientMessage {
    Control(ControlMessage),
    Event(BiometricEvent),
}

// Pushed to the client
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Snapshot {
        snapshot: BiometricSnapshot,
        factors: Vec<BiometricFactor>,
    },
    Decision(AnalysisOutcome),
    Error {
        code: u16,
        message: String,
    },
}

// WebSocket session owning one biometric engine
pub struct BiometricSession {
    id: SessionId,
    heartbeat: Instant,
    engine: BiometricEngine,
    context: TransactionContext,
    analyzer: Arc<TransactionAnalyzer>,
    tick_interval: Duration,
    heartbeat_interval: Duration,
    client_timeout: Duration,
    tick_handle: Option<SpawnHandle>,
    analysis_in_flight: bool,
}

impl BiometricSession {
    pub fn new(state: &AppState) -> Self {
        let session = &state.config.session;

        BiometricSession {
            id: Uuid::new_v4(),
            heartbeat: Instant::now(),
            engine: BiometricEngine::new(state.clock.clone()),
            context: TransactionContext::default(),
            analyzer: state.analyzer.clone(),
            tick_interval: state.tick_interval(),
            heartbeat_interval: Duration::from_secs(session.heartbeat_interval_secs),
            client_timeout: Duration::from_secs(session.client_timeout_secs),
            tick_handle: None,
            analysis_in_flight: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Apply a raw event. Returns true when the session was reset.
    fn apply_event(&mut self, event: &BiometricEvent) -> bool {
        self.engine.ingest(event);

        if *event == BiometricEvent::Reset {
            // A fresh session also starts with an empty transaction form
            self.context = TransactionContext::default();
            return true;
        }
        false
    }

    fn apply_context(&mut self, amount: &str, merchant_type: MerchantCategory) -> u32 {
        self.context = TransactionContext::from_input(amount, merchant_type);
        self.engine.set_transaction_context(&self.context)
    }

    // Arm the periodic update of time-driven metrics
    fn start_ticks(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let handle = ctx.run_interval(self.tick_interval, |act, ctx| {
            act.engine.tick();
            act.push_snapshot(ctx);
        });
        self.tick_handle = Some(handle);
    }

    fn restart_ticks(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        if let Some(handle) = self.tick_handle.take() {
            ctx.cancel_future(handle);
        }
        self.start_ticks(ctx);
    }

    // Send heartbeat ping
    fn heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(self.heartbeat_interval, |act, ctx| {
            // Check client heartbeat
            if Instant::now().duration_since(act.heartbeat) > act.client_timeout {
                warn!("WebSocket client timeout: {}", act.id);
                ctx.stop();
                return;
            }

            ctx.ping(b"");
        });
    }

    fn push_snapshot(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let snapshot = self.engine.snapshot().clone();
        let factors = evaluate_factors(&snapshot, &self.context);
        self.send(ctx, &ServerMessage::Snapshot { snapshot, factors });
    }

    fn send(&self, ctx: &mut ws::WebsocketContext<Self>, message: &ServerMessage) {
        match serde_json::to_string(message) {
            Ok(text) => ctx.text(text),
            Err(e) => error!("Failed to encode message for session {}: {}", self.id, e),
        }
    }

    fn send_error(&self, ctx: &mut ws::WebsocketContext<Self>, code: u16, message: impl Into<String>) {
        self.send(
            ctx,
            &ServerMessage::Error {
                code,
                message: message.into(),
            },
        );
    }

    fn handle_control(&mut self, ctx: &mut ws::WebsocketContext<Self>, message: ControlMessage) {
        match message {
            ControlMessage::Context {
                amount,
                merchant_type,
            } => {
                let risk = self.apply_context(&amount, merchant_type);
                debug!("Session {} context: {} risk {}", self.id, merchant_type, risk);
            }
            ControlMessage::Snapshot => self.push_snapshot(ctx),
            ControlMessage::Analyze { environment } => self.handle_analyze(ctx, environment),
        }
    }

    fn handle_analyze(&mut self, ctx: &mut ws::WebsocketContext<Self>, environment: EnvironmentInfo) {
        if self.analysis_in_flight {
            self.send_error(ctx, 409, "Analysis already in progress");
            return;
        }
        self.analysis_in_flight = true;

        let analyzer = self.analyzer.clone();
        let snapshot = self.engine.snapshot().clone();
        let context = self.context.clone();

        let fut = async move { analyzer.analyze(&snapshot, &context, &environment).await };

        ctx.spawn(fut.into_actor(self).map(|result, act, ctx| {
            act.analysis_in_flight = false;
            match result {
                Ok(outcome) => {
                    info!(
                        "Session {} decision: {} ({:?})",
                        act.id, outcome.response.decision, outcome.source
                    );
                    act.send(ctx, &ServerMessage::Decision(outcome));
                }
                Err(e) => {
                    warn!("Session {} analysis refused: {}", act.id, e);
                    act.send_error(ctx, 400, e.to_string());
                }
            }
        }));
    }
}

impl Actor for BiometricSession {
    type Context = ws::WebsocketContext<Self>;

    // Start heartbeat and tick timers on session start
    fn started(&mut self, ctx: &mut Self::Context) {
        self.heartbeat(ctx);
        self.start_ticks(ctx);

        info!("Biometric session established: {}", self.id);
    }

    // Timers are owned by the context and stop with it
    fn stopped(&mut self, _: &mut Self::Context) {
        info!(
            "Biometric session closed: {} after {} interactions",
            self.id,
            self.engine.interaction_count()
        );
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for BiometricSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.heartbeat = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.heartbeat = Instant::now();
                trace!("Session {} received: {}", self.id, text);

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Control(message)) => self.handle_control(ctx, message),
                    Ok(ClientMessage::Event(event)) => {
                        if self.apply_event(&event) {
                            self.restart_ticks(ctx);
                        }
                    }
                    Err(e) => {
                        warn!("Failed to parse WebSocket message: {}", e);
                        self.send_error(ctx, 400, "Invalid message format");
                    }
                }
            }
            Ok(ws::Message::Binary(bin)) => {
                warn!("Unexpected binary message: {} bytes", bin.len());
            }
            Ok(ws::Message::Close(reason)) => {
                info!("WebSocket connection closing: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            Err(e) => {
                warn!("WebSocket protocol error on session {}: {}", self.id, e);
                ctx.stop();
            }
            _ => {}
        }
    }
}
